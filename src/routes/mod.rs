use axum::{middleware, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{Config, StoreHandle};

mod health;
mod readings;
mod timing;

pub use timing::PROCESS_TIME_HEADER;

// ---

pub fn router(store: StoreHandle, config: Config) -> Router {
    // ---
    Router::new()
        .merge(readings::router())
        .merge(health::router())
        .layer(middleware::from_fn(timing::process_time))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state((store, config))
}
