// src/routes/timing.rs
//! Response-time header middleware.

use std::time::Instant;

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

/// Header carrying the handler time in seconds.
pub const PROCESS_TIME_HEADER: &str = "x-process-time";

/// Measure the wrapped request and report the elapsed seconds in
/// [`PROCESS_TIME_HEADER`].
pub async fn process_time(request: Request, next: Next) -> Response {
    // ---
    let started = Instant::now();
    let mut response = next.run(request).await;

    let elapsed = started.elapsed().as_secs_f64();
    if let Ok(value) = HeaderValue::from_str(&format!("{elapsed:.6}")) {
        response.headers_mut().insert(PROCESS_TIME_HEADER, value);
    }
    response
}
