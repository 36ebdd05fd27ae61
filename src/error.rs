//! Error types for the CR310 ingestion and query paths.
//!
//! [`ReadingError`] is the single taxonomy surfaced to callers. Validation
//! failures become client errors (`400`) carrying a human-readable reason;
//! store failures become server errors (`500`) with a generic detail and a
//! full log entry. Storage backends report [`StoreError`], which converts
//! into [`ReadingError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorBody;

/// Result type alias using `ReadingError`.
pub type ReadingResult<T> = Result<T, ReadingError>;

#[derive(Debug, Error)]
pub enum ReadingError {
    // === Structural ===
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("{0}")]
    TypeMismatch(String),

    // === Semantic ===
    #[error("{0}")]
    InvalidFormat(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Values out of range: {}", .0.join(", "))]
    OutOfRange(Vec<String>),

    #[error("Duplicate reading detected: {equipo} at {timestamp}")]
    DuplicateReading { equipo: String, timestamp: String },

    #[error("Duplicate reading detected: {equipo} at {timestamp} is already stored")]
    DuplicateKey { equipo: String, timestamp: String },

    // === Normalization ===
    #[error("Null value detected for {0}")]
    NullValue(&'static str),

    #[error("Inconsistent values detected in reading: temperature spread {spread:.2} exceeds {limit}")]
    InconsistentValues { spread: f64, limit: f64 },

    // === Infrastructure ===
    #[error("Database connection unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Unexpected failure: {0}")]
    UnexpectedFailure(String),
}

impl ReadingError {
    // ---
    /// Validation-category errors are the caller's fault and never retried.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            ReadingError::StoreUnavailable(_) | ReadingError::UnexpectedFailure(_)
        )
    }

    /// True for either flavour of duplicate, advisory or authoritative.
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            ReadingError::DuplicateReading { .. } | ReadingError::DuplicateKey { .. }
        )
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Text placed in the response `detail` field.
    ///
    /// Server errors hide their internals; the full error is logged instead.
    pub fn detail(&self) -> String {
        match self {
            ReadingError::StoreUnavailable(_) => "Database connection unavailable".to_string(),
            ReadingError::UnexpectedFailure(_) => {
                "Internal server error while processing request".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ReadingError {
    fn into_response(self) -> Response {
        // ---
        if self.is_client_error() {
            tracing::warn!("Request rejected: {}", self);
        } else {
            tracing::error!("Request failed: {:?}", self);
        }

        let body = ErrorBody {
            detail: self.detail(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Errors reported by a [`ReadingStore`](crate::store::ReadingStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The `(equipo, timestamp)` uniqueness constraint rejected an insert.
    #[error("duplicate key: {equipo} at {timestamp}")]
    DuplicateKey { equipo: String, timestamp: String },

    /// The backend could not be reached or the pool is exhausted / closed.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for ReadingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { equipo, timestamp } => {
                ReadingError::DuplicateKey { equipo, timestamp }
            }
            StoreError::Unavailable(msg) => ReadingError::StoreUnavailable(msg),
            StoreError::Backend(msg) => ReadingError::UnexpectedFailure(msg),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_missing_fields_message_lists_all() {
        // ---
        let err = ReadingError::MissingFields(vec!["H2S_ppb", "Pressure", "timestamp"]);
        assert_eq!(
            err.to_string(),
            "Missing required fields: H2S_ppb, Pressure, timestamp"
        );
    }

    #[test]
    fn test_status_codes() {
        // ---
        assert_eq!(
            ReadingError::NullValue("SO2_ppb").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ReadingError::StoreUnavailable("down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ReadingError::UnexpectedFailure("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_error_detail_hides_internals() {
        // ---
        let err = ReadingError::UnexpectedFailure("relation does not exist".into());
        assert!(!err.detail().contains("relation"));
    }

    #[test]
    fn test_store_error_conversion() {
        // ---
        let dup: ReadingError = StoreError::DuplicateKey {
            equipo: "T101".into(),
            timestamp: "2025-10-27 18:30:00".into(),
        }
        .into();
        assert!(dup.is_duplicate());
        assert!(dup.to_string().contains("Duplicate"));

        let down: ReadingError = StoreError::Unavailable("pool closed".into()).into();
        assert!(matches!(down, ReadingError::StoreUnavailable(_)));

        let pool: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(pool, StoreError::Unavailable(_)));
    }
}
