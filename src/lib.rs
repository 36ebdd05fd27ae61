//! Ingestion and query service for CR310 datalogger readings.
//!
//! A raw reading passes structural validation, semantic validation,
//! normalization and an atomic, duplicate-protected insert before it is
//! visible through the filtered, paginated query API.
//!
//! This crate follows the Explicit Module Boundary Pattern (EMBP): sibling
//! modules import shared types from the crate root, not from each other's
//! internals, so `routes/*.rs` only know `Config`, `StoreHandle` and the core
//! entry points re-exported here.

pub mod config;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod query;
pub mod ranges;
pub mod routes;
pub mod schema;
pub mod store;
pub mod validator;

pub use config::Config;
pub use error::{ReadingError, ReadingResult, StoreError};
pub use models::{CanonicalReading, RawCr310Reading};
pub use store::{InMemoryStore, PgReadingStore, ReadingStore, StoreHandle};
