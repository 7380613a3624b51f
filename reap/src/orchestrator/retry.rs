use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Marks errors worth another attempt. Anything else fails fast.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Bounded retry with exponential, jittered backoff, applied by the
/// orchestrator around a whole fetch-validate-store attempt. Expected
/// transient conditions come back as typed outcomes, not as caught
/// panics or re-raised errors.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    /// Some attempt succeeded.
    Ok(T),
    /// Every attempt failed transiently.
    Exhausted(E),
    /// A non-transient failure stopped the attempts early.
    Fatal(E),
}

impl RetryPolicy {
    /// Delay before retrying the given zero-based failed attempt: doubles
    /// each time, capped at `max_delay`, with up to 50% added jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        let jitter: f64 = rand::random_range(0.0..=0.5);
        exp.min(self.max_delay).mul_f64(1.0 + jitter)
    }

    pub async fn retry<T, E, F, Fut>(&self, mut op: F) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + std::fmt::Display,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return RetryOutcome::Ok(value),
                Err(err) if !err.is_transient() => {
                    return RetryOutcome::Fatal(err)
                }
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return RetryOutcome::Exhausted(err);
                    }
                    let delay = self.delay_for(attempt - 1);
                    warn!(
                        "transient failure (attempt {attempt}/{}), retrying in {delay:?}: {err}",
                        self.max_attempts
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use thiserror::Error;

    #[derive(Error, Debug)]
    enum FetchError {
        #[error("connection reset")]
        ConnectionReset,
        #[error("not found")]
        NotFound,
    }

    impl Transient for FetchError {
        fn is_transient(&self) -> bool {
            matches!(self, FetchError::ConnectionReset)
        }
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let attempts = AtomicU32::new(0);
        let outcome = policy(4)
            .retry(|| async {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(FetchError::ConnectionReset)
                } else {
                    Ok(42)
                }
            })
            .await;

        assert!(matches!(outcome, RetryOutcome::Ok(42)));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_max_attempts() {
        let attempts = AtomicU32::new(0);
        let outcome: RetryOutcome<(), _> = policy(3)
            .retry(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::ConnectionReset)
            })
            .await;

        assert!(matches!(outcome, RetryOutcome::Exhausted(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_stops_immediately() {
        let attempts = AtomicU32::new(0);
        let outcome: RetryOutcome<(), _> = policy(5)
            .retry(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::NotFound)
            })
            .await;

        assert!(matches!(outcome, RetryOutcome::Fatal(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_delay_grows_and_is_capped() {
        let policy = policy(10);

        // jitter adds at most 50%
        assert!(policy.delay_for(0) <= Duration::from_millis(15));
        assert!(policy.delay_for(2) >= Duration::from_millis(40));
        assert!(policy.delay_for(30) <= Duration::from_millis(150));
    }
}
