// src/routes/readings.rs
//! Reading ingestion and retrieval endpoints.
//!
//! - `POST /api/v1/readings` runs one reading through the ingestion pipeline
//! - `GET /api/v1/readings` returns a filtered, paginated page of readings
//!
//! Handlers only translate between HTTP and the core: the pipeline and the
//! query service do the work, `ReadingError` picks the status code.

use std::time::Instant;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::models::{ApiResponse, ErrorBody, ReadingsListResponse};
use crate::query::{query_readings, ReadingsQuery};
use crate::{pipeline, Config, StoreHandle};

// ---

pub fn router() -> Router<(StoreHandle, Config)> {
    // ---
    Router::new().route("/api/v1/readings", post(create_reading).get(list_readings))
}

/// Request parameters the routing layer could not parse (malformed JSON,
/// non-integer `limit`, ...).
fn unprocessable(detail: String) -> Response {
    // ---
    warn!("Parameter validation failed: {}", detail);
    (StatusCode::UNPROCESSABLE_ENTITY, Json(ErrorBody { detail })).into_response()
}

async fn create_reading(
    State((store, config)): State<(StoreHandle, Config)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    // ---
    let started = Instant::now();
    info!("POST /api/v1/readings");

    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return unprocessable(rejection.body_text()),
    };

    let outcome = pipeline::ingest(&store, &body).await;

    let elapsed = started.elapsed();
    if elapsed > config.slow_request_threshold() {
        warn!(
            "Response time exceeded {} ms: {:.3}s",
            config.slow_request_ms,
            elapsed.as_secs_f64()
        );
    }

    match outcome {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::new(true, "Reading stored successfully", 200)),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn list_readings(
    State((store, _config)): State<(StoreHandle, Config)>,
    params: Result<Query<ReadingsQuery>, QueryRejection>,
) -> Response {
    // ---
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return unprocessable(rejection.body_text()),
    };
    info!("GET /api/v1/readings - {:?}", params);

    match query_readings(&store, &params).await {
        Ok(result) => {
            debug!("GET /api/v1/readings - {}", result.message);
            let body = ReadingsListResponse {
                success: true,
                message: result.message,
                count: result.count,
                total: result.total,
                data: result.readings,
                timestamp: Some(Utc::now()),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => e.into_response(),
    }
}
