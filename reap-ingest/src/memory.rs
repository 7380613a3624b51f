//! In-memory implementation of the `ListingStore` trait. One mutex guards
//! the whole map, which is also what makes racing first-time inserts for
//! the same URL resolve to exactly one insert.

use crate::record::StoredRecord;
use crate::stats::PipelineStats;
use crate::store::{Filter, ListingStore, StorageError, UpsertOutcome};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

pub struct InMemoryListingStore {
    records: Mutex<HashMap<String, StoredRecord>>,
    stats: Arc<PipelineStats>,
}

impl InMemoryListingStore {
    pub fn new(stats: Arc<PipelineStats>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            stats,
        }
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredRecord>>, StorageError>
    {
        self.records
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))
    }
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn upsert(
        &self,
        record: StoredRecord,
    ) -> Result<UpsertOutcome, StorageError> {
        let mut records = self.lock()?;
        match records.get(&record.url) {
            Some(existing) if existing.updated_at >= record.updated_at => {
                debug!("stale write skipped for {}", record.url);
                self.stats.record_duplicate();
                Ok(UpsertOutcome::SkippedStale)
            }
            Some(_) => {
                records.insert(record.url.clone(), record);
                Ok(UpsertOutcome::Updated)
            }
            None => {
                records.insert(record.url.clone(), record);
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    async fn get(&self, url: &str) -> Result<Option<StoredRecord>, StorageError> {
        Ok(self.lock()?.get(url).cloned())
    }

    async fn list(
        &self,
        filters: &[Filter],
        limit: usize,
        offset: usize,
    ) -> Result<Vec<StoredRecord>, StorageError> {
        let records = self.lock()?;
        let mut matched: Vec<StoredRecord> = records
            .values()
            .filter(|record| filters.iter().all(|f| f.matches(record)))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.url.cmp(&b.url));
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }

    async fn update(
        &self,
        url: &str,
        fields: &HashMap<String, Value>,
    ) -> Result<bool, StorageError> {
        let mut records = self.lock()?;
        let Some(record) = records.get_mut(url) else {
            return Ok(false);
        };

        for (name, value) in fields {
            match (name.as_str(), value) {
                ("price", Value::Number(n)) => {
                    record.price = n.as_f64().ok_or_else(|| {
                        StorageError::Backend(format!("price out of range: {n}"))
                    })?;
                }
                ("address", Value::String(s)) => record.address = s.clone(),
                ("description", Value::String(s)) => {
                    record.description = s.clone()
                }
                ("contact", Value::String(s)) => {
                    record.contact = Some(s.clone())
                }
                ("contact", Value::Null) => record.contact = None,
                ("source", Value::String(s)) => record.source = s.clone(),
                _ => return Err(StorageError::UnknownField(name.clone())),
            }
        }
        record.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(&self, url: &str) -> Result<bool, StorageError> {
        Ok(self.lock()?.remove(url).is_some())
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.len())
    }
}

impl std::fmt::Debug for InMemoryListingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let records = self.records.lock().unwrap();
        f.debug_struct("InMemoryListingStore")
            .field("records", &records.len())
            .finish()
    }
}
