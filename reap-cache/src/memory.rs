//! In-memory implementation of the `CacheStore` trait, for tests and demos.
//! Entries are kept in a map keyed by `(provider, digest)`.

use crate::{CacheEntry, CacheError, CacheKey, CacheStore};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: Mutex<HashMap<(String, String), CacheEntry>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        let map_key = (key.provider().to_string(), key.digest().to_string());
        match entries.get(&map_key) {
            Some(entry) if entry.is_expired(Utc::now()) => {
                entries.remove(&map_key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, entry: CacheEntry) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        entries.insert((entry.provider.clone(), entry.key.clone()), entry);
        Ok(())
    }

    async fn clear(&self, scope: Option<&str>) -> Result<u64, CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        let before = entries.len();
        match scope {
            Some(provider) => {
                entries.retain(|(p, _), _| p != provider);
            }
            None => entries.clear(),
        }
        Ok((before - entries.len()) as u64)
    }
}
