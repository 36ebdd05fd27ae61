//! Storage seam for canonical readings.
//!
//! The pipeline and the query service only see [`ReadingStore`]. The
//! `(equipo, timestamp)` uniqueness invariant is the backend's job: `insert`
//! must check and write atomically and report a conflict as
//! [`StoreError::DuplicateKey`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::CanonicalReading;

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgReadingStore;

/// Largest page a single query may return.
pub const MAX_PAGE_SIZE: i64 = 1000;

/// Process-wide store handle. `None` when the initial connection failed;
/// every core operation checks it and fails with `StoreUnavailable`.
pub type StoreHandle = Option<Arc<dyn ReadingStore>>;

/// Optional constraints applied by [`ReadingStore::query`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingFilter {
    // ---
    /// Exact equipment identifier.
    pub equipo: Option<String>,
    /// Inclusive lower bound on the timestamp string.
    pub start: Option<String>,
    /// Inclusive upper bound on the timestamp string.
    pub end: Option<String>,
}

impl ReadingFilter {
    // ---
    /// In-process evaluation of the filter. Timestamps share one zero-padded
    /// layout, so string comparison orders them chronologically.
    pub fn matches(&self, reading: &CanonicalReading) -> bool {
        self.equipo.as_ref().map_or(true, |e| &reading.equipo == e)
            && self
                .start
                .as_ref()
                .map_or(true, |s| reading.timestamp.as_str() >= s.as_str())
            && self
                .end
                .as_ref()
                .map_or(true, |e| reading.timestamp.as_str() <= e.as_str())
    }
}

/// One page of query results plus the unpaginated match count.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub readings: Vec<CanonicalReading>,
    pub total: i64,
}

/// Clamp caller-supplied pagination into the bounds every backend honours.
pub fn clamp_pagination(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_PAGE_SIZE), offset.max(0))
}

#[async_trait]
pub trait ReadingStore: Send + Sync {
    // ---
    /// Persist a reading. Fails with `DuplicateKey` if `(equipo, timestamp)`
    /// already exists; the check and the write are a single atomic step.
    async fn insert(&self, reading: &CanonicalReading) -> Result<(), StoreError>;

    /// Advisory point lookup. Never authoritative.
    async fn exists(&self, equipo: &str, timestamp: &str) -> Result<bool, StoreError>;

    /// Readings matching `filter`, newest timestamp first, ties broken by
    /// `equipo` ascending.
    async fn query(&self, filter: &ReadingFilter, limit: i64, offset: i64)
        -> Result<Page, StoreError>;

    /// Cheap reachability check.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release backend resources.
    async fn close(&self) {}
}
