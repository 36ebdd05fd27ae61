// src/routes/health.rs
//! Liveness and readiness endpoints for the CR310 API.
//!
//! This module defines the `/` and `/health` routes used by container
//! orchestrators and CI pipelines. It is a sibling module in the `routes`
//! directory and follows the Explicit Module Boundary Pattern (EMBP):
//! - Internal to this file: endpoint handlers
//! - Exports to the gateway (`mod.rs`): a subrouter containing both routes
//!
//! Both routes always answer `200`; the body's `success`/`code` fields carry
//! the store's state so a probe can tell "process up" from "store reachable".

use axum::{extract::State, routing::get, Json, Router};
use tracing::error;

use crate::models::ApiResponse;
use crate::{Config, StoreHandle};

/// Handle `GET /`.
///
/// Static liveness answer; does not touch the store.
async fn root() -> Json<ApiResponse> {
    Json(ApiResponse::new(true, "CR310 Datalogger API is running", 200))
}

/// Handle `GET /health`.
///
/// Pings the store and reports the result.
async fn health(State((store, _config)): State<(StoreHandle, Config)>) -> Json<ApiResponse> {
    // ---
    let Some(store) = store else {
        return Json(ApiResponse::new(false, "Database connection failed", 500));
    };

    match store.ping().await {
        Ok(()) => Json(ApiResponse::new(true, "Service is healthy", 200)),
        Err(e) => {
            error!("Health check failed: {}", e);
            Json(ApiResponse::new(
                false,
                format!("Database connection error: {e}"),
                500,
            ))
        }
    }
}

/// Create a subrouter containing the `/` and `/health` routes.
pub fn router() -> Router<(StoreHandle, Config)> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}
