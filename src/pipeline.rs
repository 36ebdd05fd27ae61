//! Ingestion pipeline: structural validation, semantic validation,
//! normalization, storage.
//!
//! Linear, no branching back:
//! `Received → StructurallyValid → SemanticallyValid → Normalized → Stored`.
//! Any stage may reject, which short-circuits the rest. Nothing is written
//! before the final stage, so a rejected reading leaves no trace in the store.

use std::fmt;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::error::{ReadingError, ReadingResult};
use crate::models::CanonicalReading;
use crate::normalizer::normalize;
use crate::store::{ReadingStore, StoreHandle};
use crate::validator::{validate_semantics, validate_structure};

/// Last stage a reading successfully reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    StructurallyValid,
    SemanticallyValid,
    Normalized,
    Stored,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::StructurallyValid => "structurally_valid",
            Stage::SemanticallyValid => "semantically_valid",
            Stage::Normalized => "normalized",
            Stage::Stored => "stored",
        };
        f.write_str(name)
    }
}

/// Run one raw reading through the whole pipeline.
///
/// Returns the stored [`CanonicalReading`] or the reason it was rejected.
/// A missing store handle fails before any stage runs.
pub async fn ingest(store: &StoreHandle, body: &Value) -> ReadingResult<CanonicalReading> {
    // ---
    let Some(store) = store else {
        error!("Database client not initialized");
        return Err(ReadingError::StoreUnavailable(
            "store handle not initialized".to_string(),
        ));
    };

    let mut stage = Stage::Received;
    let outcome = run_stages(store.as_ref(), body, &mut stage).await;

    match &outcome {
        Ok(reading) => info!(
            "Reading stored successfully: {} - {}",
            reading.equipo, reading.timestamp
        ),
        Err(e) if e.is_client_error() => warn!(%stage, "Reading rejected: {}", e),
        Err(e) => error!(%stage, "Reading failed: {:?}", e),
    }

    outcome
}

async fn run_stages(
    store: &dyn ReadingStore,
    body: &Value,
    stage: &mut Stage,
) -> ReadingResult<CanonicalReading> {
    // ---
    let raw = validate_structure(body)?;
    *stage = Stage::StructurallyValid;

    let raw = validate_semantics(raw, store).await?;
    *stage = Stage::SemanticallyValid;

    let reading = normalize(&raw)?;
    *stage = Stage::Normalized;
    debug!("Normalized reading {}", reading.id);

    store.insert(&reading).await?;
    *stage = Stage::Stored;

    Ok(reading)
}
