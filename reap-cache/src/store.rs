use crate::{CacheEntry, CacheError, CacheKey};
use async_trait::async_trait;
use std::sync::Arc;

/// Key/value persistence of past API responses with time-based expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up an entry. `None` covers both "never cached" and "expired";
    /// callers cannot distinguish the two cases.
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError>;

    /// Write or fully replace an entry.
    async fn set(&self, entry: CacheEntry) -> Result<(), CacheError>;

    /// Remove all entries for the `scope` provider, or for every provider
    /// when `scope` is `None`. Returns the number of entries removed.
    /// Administrative operation, not used on the hot path.
    async fn clear(&self, scope: Option<&str>) -> Result<u64, CacheError>;
}

pub type SharedCacheStore = Arc<dyn CacheStore + Send + Sync>;
