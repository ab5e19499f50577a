//! Retry policy for idempotent upstream reads
//!
//! Fixed attempt cap with linear backoff, gated on the classifier calling the failure
//! retryable. Writes (transfer booking and cancellation) never go through this.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::classifier;
use crate::config::RetryConfig;
use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before retry `n` is `backoff * n`
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }

    /// Single attempt, no retries
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    pub async fn run<T, F, Fut>(&self, request_id: &str, mut operation: F) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts && classifier::is_retryable(&err) => {
                    let delay = self.backoff * attempt;
                    warn!(
                        request_id,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying upstream call"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::UpstreamFailure;
    use reqwest::header::HeaderMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn failure(status: u16) -> ServiceError {
        UpstreamFailure::from_response(status, HeaderMap::new(), String::new()).into()
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_retries_server_errors_up_to_cap() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast_policy()
            .run("req-1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(failure(503))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_attempt_can_succeed() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .run("req-1", || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(failure(429))
                } else {
                    Ok("ok")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_failures_are_not_retried() {
        for status in [400, 401, 403, 404] {
            let calls = AtomicU32::new(0);
            let result: Result<(), _> = fast_policy()
                .run("req-1", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(failure(status))
                })
                .await;

            assert!(result.is_err());
            assert_eq!(calls.load(Ordering::SeqCst), 1, "status {status}");
        }
    }

    #[tokio::test]
    async fn test_none_policy_runs_once() {
        let calls = AtomicU32::new(0);
        let _: Result<(), _> = RetryPolicy::none()
            .run("req-1", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(failure(502))
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_from_config_never_drops_below_one_attempt() {
        let policy = RetryPolicy::from_config(&RetryConfig {
            max_attempts: 0,
            backoff_ms: 50,
        });
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.backoff, Duration::from_millis(50));
    }
}
