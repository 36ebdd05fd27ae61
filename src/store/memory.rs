use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{clamp_pagination, Page, ReadingFilter, ReadingStore};
use crate::error::StoreError;
use crate::models::CanonicalReading;

type Key = (String, String);

/// Store kept entirely in process memory.
///
/// Used by the test suites and for running the API without PostgreSQL.
/// `set_unavailable(true)` makes every operation fail as if the backend were
/// unreachable.
#[derive(Default)]
pub struct InMemoryStore {
    readings: Mutex<BTreeMap<Key, CanonicalReading>>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    pub async fn len(&self) -> usize {
        self.readings.lock().await.len()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("in-memory store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReadingStore for InMemoryStore {
    async fn insert(&self, reading: &CanonicalReading) -> Result<(), StoreError> {
        // ---
        self.check_available()?;

        let key = (reading.equipo.clone(), reading.timestamp.clone());
        match self.readings.lock().await.entry(key) {
            Entry::Occupied(_) => Err(StoreError::DuplicateKey {
                equipo: reading.equipo.clone(),
                timestamp: reading.timestamp.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(reading.clone());
                Ok(())
            }
        }
    }

    async fn exists(&self, equipo: &str, timestamp: &str) -> Result<bool, StoreError> {
        // ---
        self.check_available()?;

        let key = (equipo.to_string(), timestamp.to_string());
        Ok(self.readings.lock().await.contains_key(&key))
    }

    async fn query(
        &self,
        filter: &ReadingFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Page, StoreError> {
        // ---
        self.check_available()?;
        let (limit, offset) = clamp_pagination(limit, offset);

        let guard = self.readings.lock().await;
        let mut matching: Vec<&CanonicalReading> =
            guard.values().filter(|r| filter.matches(r)).collect();

        matching.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| a.equipo.cmp(&b.equipo))
        });

        let total = matching.len() as i64;
        let readings = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok(Page { readings, total })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}
