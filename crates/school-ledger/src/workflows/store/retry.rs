use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::RepositoryError;
use crate::config::StoreConfig;

/// Upper bound for a single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(2);

/// Bounded exponential backoff applied to store reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_delay,
        }
    }

    /// Single attempt, no sleeping.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay before retry number `attempt` (1-based): base, 2x base, 4x base...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&StoreConfig::default())
    }
}

impl From<&StoreConfig> for RetryPolicy {
    fn from(config: &StoreConfig) -> Self {
        Self::new(config.read_attempts, config.retry_backoff)
    }
}

/// Run a read against the store, retrying only transient
/// [`RepositoryError::Unavailable`] failures within the policy's budget.
pub async fn read_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut read: F,
) -> Result<T, RepositoryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RepositoryError>>,
{
    let mut attempt = 1;
    loop {
        match read().await {
            Err(RepositoryError::Unavailable(reason)) if attempt < policy.attempts => {
                let delay = policy.delay_for(attempt);
                warn!(operation, attempt, ?delay, %reason, "ledger store unavailable, retrying read");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delays_grow_exponentially_and_are_capped() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for(40), MAX_BACKOFF);
    }

    #[test]
    fn zero_attempts_is_raised_to_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts(), 1);
    }

    #[tokio::test]
    async fn recovers_from_transient_unavailability() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(3, Duration::ZERO);

        let value = read_with_retry(&policy, "test_read", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(RepositoryError::Unavailable("warming up".to_string()))
            } else {
                Ok(7)
            }
        })
        .await
        .expect("third attempt succeeds");

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_budget_is_spent() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(2, Duration::ZERO);

        let outcome: Result<(), _> = read_with_retry(&policy, "test_read", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::Unavailable("offline".to_string()))
        })
        .await;

        assert!(matches!(outcome, Err(RepositoryError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(5, Duration::ZERO);

        let outcome: Result<(), _> = read_with_retry(&policy, "test_read", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::NotFound)
        })
        .await;

        assert_eq!(outcome, Err(RepositoryError::NotFound));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
