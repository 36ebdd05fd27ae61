//! Query service: parameter parsing and clamping in front of `ReadingStore::query`.

use serde::Deserialize;
use tracing::{debug, error};

use crate::error::{ReadingError, ReadingResult};
use crate::models::CanonicalReading;
use crate::store::{clamp_pagination, ReadingFilter, StoreHandle};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_LIMIT: i64 = 100;

/// Query parameters for filtering readings
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReadingsQuery {
    // ---
    pub equipo: Option<String>,
    /// Inclusive lower bound, `YYYY-MM-DD HH:MM:SS` (prefixes also compare)
    pub start_date: Option<String>,
    /// Inclusive upper bound, same layout as `start_date`
    pub end_date: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Empty query-string values mean "no filter".
fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

impl ReadingsQuery {
    // ---
    pub fn filter(&self) -> ReadingFilter {
        ReadingFilter {
            equipo: non_empty(&self.equipo),
            start: non_empty(&self.start_date),
            end: non_empty(&self.end_date),
        }
    }

    /// `(limit, offset)` clamped into `[1, 1000]` and `>= 0`.
    pub fn pagination(&self) -> (i64, i64) {
        clamp_pagination(
            self.limit.unwrap_or(DEFAULT_LIMIT),
            self.offset.unwrap_or(0),
        )
    }
}

/// Result bundle handed back to the API layer.
#[derive(Debug)]
pub struct QueryResult {
    pub readings: Vec<CanonicalReading>,
    pub count: usize,
    pub total: i64,
    pub message: String,
}

impl QueryResult {
    // ---
    /// True when rows beyond this page still match the filter.
    pub fn has_more(&self, offset: i64) -> bool {
        offset.saturating_add(self.count as i64) < self.total
    }
}

/// Human-readable summary, e.g.
/// `Retrieved 2 of 10 readings with filters: equipo=T101, from 2025-10-27 00:00:00`.
fn describe(filter: &ReadingFilter, count: usize, total: i64) -> String {
    // ---
    let mut parts = Vec::new();
    if let Some(equipo) = &filter.equipo {
        parts.push(format!("equipo={equipo}"));
    }
    if let Some(start) = &filter.start {
        parts.push(format!("from {start}"));
    }
    if let Some(end) = &filter.end {
        parts.push(format!("to {end}"));
    }

    let suffix = if parts.is_empty() {
        String::new()
    } else {
        format!(" with filters: {}", parts.join(", "))
    };
    format!("Retrieved {count} of {total} readings{suffix}")
}

/// Run a filtered, paginated read against the store.
pub async fn query_readings(
    store: &StoreHandle,
    params: &ReadingsQuery,
) -> ReadingResult<QueryResult> {
    // ---
    let Some(store) = store else {
        error!("Database client not initialized");
        return Err(ReadingError::StoreUnavailable(
            "store handle not initialized".to_string(),
        ));
    };

    let filter = params.filter();
    let (limit, offset) = params.pagination();
    debug!("Apply filter: {:?} limit={} offset={}", filter, limit, offset);

    let page = store.query(&filter, limit, offset).await?;
    let count = page.readings.len();

    Ok(QueryResult {
        message: describe(&filter, count, page.total),
        readings: page.readings,
        count,
        total: page.total,
    })
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::pipeline::ingest;
    use crate::store::{InMemoryStore, ReadingStore};
    use serde_json::json;
    use std::sync::Arc;

    async fn seeded(n: u32) -> StoreHandle {
        // ---
        let store: StoreHandle = Some(Arc::new(InMemoryStore::new()) as Arc<dyn ReadingStore>);
        for i in 0..n {
            let equipo = if i % 2 == 0 { "T101" } else { "T102" };
            let body = json!({
                "equipo": equipo,
                "SO2_ppb": 25.43, "H2S_ppb": 2.18, "Reaction_Temp": 35.0,
                "IZS_Temp": 34.2, "PMT_Temp": 36.1, "SampleFlow": 452.3,
                "Pressure": 29.76, "UVLampIntensity": 403.5, "Box_Temp": 33.7,
                "HVPS_V": 671.2, "Conv_Temp": 35.9, "Ozone_flow": 480.5,
                "timestamp": format!("2025-10-27 18:{:02}:00", i)
            });
            ingest(&store, &body).await.unwrap();
        }
        store
    }

    #[test]
    fn test_pagination_defaults_and_clamping() {
        // ---
        assert_eq!(ReadingsQuery::default().pagination(), (100, 0));

        let q = ReadingsQuery {
            limit: Some(5000),
            offset: Some(-4),
            ..Default::default()
        };
        assert_eq!(q.pagination(), (1000, 0));

        let q = ReadingsQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(q.pagination(), (1, 0));
    }

    #[test]
    fn test_empty_params_mean_no_filter() {
        // ---
        let q = ReadingsQuery {
            equipo: Some(String::new()),
            start_date: Some("2025-10-27 00:00:00".into()),
            ..Default::default()
        };
        let f = q.filter();
        assert_eq!(f.equipo, None);
        assert_eq!(f.start.as_deref(), Some("2025-10-27 00:00:00"));
        assert_eq!(f.end, None);
    }

    #[test]
    fn test_describe() {
        // ---
        assert_eq!(
            describe(&ReadingFilter::default(), 0, 0),
            "Retrieved 0 of 0 readings"
        );
        let f = ReadingFilter {
            equipo: Some("T101".into()),
            start: Some("2025-10-27 00:00:00".into()),
            end: Some("2025-10-27 23:59:59".into()),
        };
        assert_eq!(
            describe(&f, 2, 7),
            "Retrieved 2 of 7 readings with filters: equipo=T101, \
             from 2025-10-27 00:00:00, to 2025-10-27 23:59:59"
        );
    }

    #[tokio::test]
    async fn test_total_ignores_pagination() {
        // ---
        let store = seeded(7).await;

        for (limit, offset) in [(1, 0), (3, 2), (100, 0), (2, 6), (5, 50)] {
            let q = ReadingsQuery {
                limit: Some(limit),
                offset: Some(offset),
                ..Default::default()
            };
            let result = query_readings(&store, &q).await.unwrap();
            assert!(result.count as i64 <= limit);
            assert_eq!(result.count, result.readings.len());
            assert_eq!(result.total, 7);
        }
    }

    #[tokio::test]
    async fn test_filter_by_equipo_and_has_more() {
        // ---
        let store = seeded(7).await;
        let q = ReadingsQuery {
            equipo: Some("T101".into()),
            limit: Some(3),
            ..Default::default()
        };

        let result = query_readings(&store, &q).await.unwrap();
        assert_eq!(result.total, 4);
        assert_eq!(result.count, 3);
        assert!(result.has_more(0));
        assert!(!result.has_more(1));
        assert!(!result.has_more(i64::MAX));
        assert!(result.readings.iter().all(|r| r.equipo == "T101"));
        assert_eq!(result.readings[0].timestamp, "2025-10-27 18:06:00");
    }

    #[tokio::test]
    async fn test_unknown_equipo_returns_empty_page() {
        // ---
        let store = seeded(3).await;
        let q = ReadingsQuery {
            equipo: Some("NONEXISTENT".into()),
            ..Default::default()
        };

        let result = query_readings(&store, &q).await.unwrap();
        assert_eq!(result.count, 0);
        assert_eq!(result.total, 0);
    }

    #[tokio::test]
    async fn test_missing_store_handle() {
        // ---
        let err = query_readings(&None, &ReadingsQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ReadingError::StoreUnavailable(_)));
    }
}
