use crate::limiter::RateLimiter;
use async_trait::async_trait;
use reap_cache::{CacheEntry, CacheError, CacheKey, SharedCacheStore};
use reap_config::ProviderConfig;
use reap_ingest::{PipelineStats, StatsSnapshot};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure reported by a live upstream fetch.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Upstream returned status {0}")]
    Status(u16),

    #[error("Request timed out")]
    Timeout,
}

impl UpstreamError {
    /// Timeouts, 429s and 5xx responses are worth retrying; other HTTP
    /// statuses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            UpstreamError::Timeout => true,
            UpstreamError::Status(status) => *status == 429 || *status >= 500,
            UpstreamError::Request(_) => true,
        }
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if let Some(status) = err.status() {
            UpstreamError::Status(status.as_u16())
        } else {
            UpstreamError::Request(err.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// The live-fetch seam: one call against a provider's API. Implemented per
/// provider; the gateway neither knows nor cares how the bytes are fetched.
#[async_trait]
pub trait ProviderFetch: Send + Sync {
    async fn fetch(
        &self,
        endpoint: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Value, UpstreamError>;
}

/// Composes the cache store and the rate limiter around a live fetch.
///
/// Holds no persistent state of its own; everything lives in the cache
/// store and the limiter. Caching applies to successful responses only,
/// and upstream failures propagate to the caller unchanged.
pub struct CachingGateway {
    cache: SharedCacheStore,
    limiter: RateLimiter,
    providers: HashMap<String, ProviderConfig>,
    stats: Arc<PipelineStats>,
}

impl CachingGateway {
    pub fn new(
        cache: SharedCacheStore,
        providers: Vec<ProviderConfig>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        let limiter = RateLimiter::from_providers(providers.iter());
        Self {
            cache,
            limiter,
            providers: providers.into_iter().map(|p| (p.name.clone(), p)).collect(),
            stats,
        }
    }

    pub async fn fetch(
        &self,
        provider: &str,
        endpoint: &str,
        params: &BTreeMap<String, String>,
        live: &dyn ProviderFetch,
    ) -> Result<Value, GatewayError> {
        let config = self
            .providers
            .get(provider)
            .ok_or_else(|| GatewayError::UnknownProvider(provider.to_string()))?;

        let key = CacheKey::new(provider, endpoint, params);

        if config.cache_enabled {
            match self.cache.get(&key).await {
                Ok(Some(entry)) => {
                    self.stats.record_cache_hit();
                    debug!("cache hit for {key}");
                    return Ok(entry.payload);
                }
                Ok(None) => self.stats.record_cache_miss(),
                Err(err) => {
                    // A broken cache must never fail the caller; degrade to
                    // a live fetch.
                    warn!("cache read failed for {key}: {err}");
                    self.stats.record_cache_error();
                }
            }
        }

        self.limiter.acquire(provider).await;
        let payload = live.fetch(endpoint, params).await?;

        if config.cache_enabled {
            let entry = CacheEntry::new(
                &key,
                endpoint,
                params.clone(),
                payload.clone(),
                config.ttl(),
            );
            if let Err(err) = self.cache.set(entry).await {
                warn!("cache write failed for {key}: {err}");
                self.stats.record_cache_error();
            }
        }

        Ok(payload)
    }

    /// Counter snapshot for operators.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Drop cached entries for one provider, or for all of them. Returns
    /// the number removed. Administrative, not part of the hot path.
    pub async fn clear(&self, scope: Option<&str>) -> Result<u64, CacheError> {
        self.cache.clear(scope).await
    }
}
