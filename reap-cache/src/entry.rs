use crate::CacheKey;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A cached upstream response.
///
/// Owned exclusively by the cache store; immutable once written except for
/// full replacement on a later live fetch. An entry past its TTL is treated
/// as absent by every reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Digest part of the cache key.
    pub key: String,
    pub provider: String,
    pub endpoint: String,
    pub params: BTreeMap<String, String>,
    pub payload: serde_json::Value,
    pub cached_at: DateTime<Utc>,
    pub ttl_secs: i64,
}

impl CacheEntry {
    pub fn new(
        key: &CacheKey,
        endpoint: &str,
        params: BTreeMap<String, String>,
        payload: serde_json::Value,
        ttl: Duration,
    ) -> Self {
        Self {
            key: key.digest().to_string(),
            provider: key.provider().to_string(),
            endpoint: endpoint.to_string(),
            params,
            payload,
            cached_at: Utc::now(),
            ttl_secs: ttl.num_seconds(),
        }
    }

    /// Expired entries are logically deleted: a read past
    /// `cached_at + ttl` is a miss, indistinguishable from never-cached.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.cached_at + Duration::seconds(self.ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_cached_at(cached_at: DateTime<Utc>, ttl_secs: i64) -> CacheEntry {
        let key = CacheKey::new("attom", "/listings", &BTreeMap::new());
        let mut entry = CacheEntry::new(
            &key,
            "/listings",
            BTreeMap::new(),
            serde_json::json!({"ok": true}),
            Duration::seconds(ttl_secs),
        );
        entry.cached_at = cached_at;
        entry
    }

    #[test]
    fn test_entry_fresh_just_before_ttl() {
        let t0 = Utc::now();
        let entry = entry_cached_at(t0, 3600);
        let just_before = t0 + Duration::seconds(3600) - Duration::seconds(1);
        assert!(!entry.is_expired(just_before));
    }

    #[test]
    fn test_entry_expired_just_after_ttl() {
        let t0 = Utc::now();
        let entry = entry_cached_at(t0, 3600);
        let just_after = t0 + Duration::seconds(3600) + Duration::seconds(1);
        assert!(entry.is_expired(just_after));
    }

    #[test]
    fn test_entry_survives_serde_round_trip() {
        let entry = entry_cached_at(Utc::now(), 60);
        let bytes = serde_json::to_vec(&entry).unwrap();
        let restored: CacheEntry = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(restored.key, entry.key);
        assert_eq!(restored.cached_at, entry.cached_at);
        assert_eq!(restored.payload, entry.payload);
    }
}
