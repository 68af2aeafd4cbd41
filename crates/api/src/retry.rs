//! Whole-statement retries for transient ledger failures.
//!
//! Only [`StatementError::is_transient`] failures are retried, and always by
//! re-running the complete statement, never a single sub-aggregation.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use dealerbook_core::StatementError;
use dealerbook_shared::ReportConfig;

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ReportConfig::default())
    }
}

impl From<&ReportConfig> for RetryPolicy {
    fn from(config: &ReportConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (0-based).
    #[must_use]
    pub fn delay(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(1 << retry.min(16))
    }

    /// Runs `operation` until it succeeds, fails permanently, or retries run out.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, StatementError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StatementError>>,
    {
        let mut retry = 0;
        loop {
            match operation().await {
                Err(err) if err.is_transient() && retry < self.max_retries => {
                    let delay = self.delay(retry);
                    warn!(
                        error = %err,
                        retry = retry + 1,
                        max_retries = self.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Transient ledger failure, retrying statement"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealerbook_core::{ChartError, LedgerError};
    use dealerbook_shared::TenantId;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy {
            max_retries: 3,
            backoff: Duration::from_millis(200),
        };
        assert_eq!(policy.delay(0), Duration::from_millis(200));
        assert_eq!(policy.delay(1), Duration::from_millis(400));
        assert_eq!(policy.delay(2), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried_until_success() {
        let attempts = &AtomicU32::new(0);
        let result = fast(2)
            .run(move || async move {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(StatementError::from(LedgerError::unavailable("refused")))
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let attempts = &AtomicU32::new(0);
        let result: Result<(), _> = fast(2)
            .run(move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(StatementError::from(LedgerError::unavailable("refused")))
            })
            .await;

        assert!(matches!(result, Err(StatementError::Ledger(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_configuration_errors_are_not_retried() {
        let attempts = &AtomicU32::new(0);
        let result: Result<(), _> = fast(5)
            .run(move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(StatementError::from(ChartError::ConfigNotFound(TenantId::new())))
            })
            .await;

        assert!(matches!(result, Err(StatementError::Chart(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_none_policy_runs_once() {
        let attempts = &AtomicU32::new(0);
        let _ = RetryPolicy::none()
            .run(move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(StatementError::from(LedgerError::unavailable("refused")))
            })
            .await;
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
