use reap_config::ProviderConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Default)]
struct ProviderState {
    last_request_at: Option<Instant>,
}

/// Serializes outbound calls per provider to at most one per configured
/// interval. Only live fetches go through here; cache hits bypass the
/// limiter entirely.
///
/// Waits for one provider never delay callers of another; the outer map
/// lock is never held across an await.
#[derive(Debug, Default)]
pub struct RateLimiter {
    intervals: HashMap<String, Duration>,
    states: Mutex<HashMap<String, Arc<tokio::sync::Mutex<ProviderState>>>>,
}

impl RateLimiter {
    pub fn new(budgets: impl IntoIterator<Item = (String, Duration)>) -> Self {
        Self {
            intervals: budgets.into_iter().collect(),
            states: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_providers<'a>(
        providers: impl IntoIterator<Item = &'a ProviderConfig>,
    ) -> Self {
        Self::new(providers.into_iter().filter_map(|p| {
            p.min_interval().map(|interval| (p.name.clone(), interval))
        }))
    }

    /// Suspend the caller until a live call against `provider` is safe.
    /// Providers without a configured budget proceed immediately.
    pub async fn acquire(&self, provider: &str) {
        let Some(interval) = self.intervals.get(provider).copied() else {
            return;
        };

        let state = {
            let mut states = self.states.lock().expect("limiter state poisoned");
            Arc::clone(states.entry(provider.to_string()).or_default())
        };

        let mut state = state.lock().await;
        if let Some(last) = state.last_request_at {
            let elapsed = last.elapsed();
            if elapsed < interval {
                let wait = interval - elapsed;
                debug!("throttling {provider} for {wait:?}");
                tokio::time::sleep(wait).await;
            }
        }
        // Post-wait time, not the acquire() call time; otherwise the
        // interval drifts shorter under load.
        state.last_request_at = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(rpm: f64) -> RateLimiter {
        let mut provider = ProviderConfig::new("attom");
        provider.requests_per_minute = Some(rpm);
        RateLimiter::from_providers([&provider])
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_acquires_are_spaced_out() {
        // 120 rpm -> 500ms between calls; 4 calls need at least 1.5s
        let limiter = limiter(120.0);
        let started = Instant::now();

        for _ in 0..4 {
            limiter.acquire("attom").await;
        }

        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_does_not_wait() {
        let limiter = limiter(1.0);
        let started = Instant::now();

        limiter.acquire("attom").await;

        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbudgeted_provider_is_unbounded() {
        let limiter = limiter(1.0);
        let started = Instant::now();

        for _ in 0..10 {
            limiter.acquire("open-data").await;
        }

        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_providers_do_not_block_each_other() {
        let mut attom = ProviderConfig::new("attom");
        attom.requests_per_minute = Some(1.0);
        let mut zillow = ProviderConfig::new("zillow");
        zillow.requests_per_minute = Some(1.0);
        let limiter = RateLimiter::from_providers([&attom, &zillow]);

        let started = Instant::now();
        limiter.acquire("attom").await;
        limiter.acquire("zillow").await;

        // one call each: neither provider had to wait for the other
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_time_counts_toward_interval() {
        let limiter = limiter(60.0); // 1s interval

        limiter.acquire("attom").await;
        tokio::time::sleep(Duration::from_millis(600)).await;

        let started = Instant::now();
        limiter.acquire("attom").await;

        // only the 400ms remainder is waited out
        assert_eq!(started.elapsed(), Duration::from_millis(400));
    }
}
