//! Retry wrapper shared by the concrete providers.
//!
//! Vendor failures fall into three classes: transient (rate limit or
//! momentary unavailability, retried with exponential backoff), zero-quota (the key
//! has no quota at all; retrying cannot succeed), and fatal (auth errors,
//! malformed requests). Classification is a plain function owned by each
//! provider module, since the heuristics differ per vendor and drift as
//! error formats change.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::LlmError;

/// A failed vendor call, before classification.
#[derive(Debug, Clone)]
pub struct VendorFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl VendorFailure {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Retryable: rate limit or 5xx-equivalent.
    Transient,
    /// The account/key has no quota at all. Surfaced immediately.
    ZeroQuota,
    /// Anything else. Surfaced immediately.
    Fatal,
}

pub type ClassifyFn = fn(&VendorFailure) -> FailureClass;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts beyond the first.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        // 2s, 4s, 8s. Exponential without jitter, matching vendor guidance
        // for the free tiers this service runs against.
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(2000),
            backoff_factor: 2,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    fn delay_before(&self, retry_number: u32) -> Duration {
        self.initial_delay * self.backoff_factor.pow(retry_number.saturating_sub(1))
    }
}

/// Runs `op` with the retry policy. `op` receives the 1-based attempt number.
///
/// Transient failures are retried after a backoff delay until the budget is
/// exhausted; zero-quota and fatal failures surface immediately. The returned
/// error always carries the number of attempts actually made.
pub async fn call_with_retry<T, F, Fut>(
    provider: &'static str,
    policy: RetryPolicy,
    classify: ClassifyFn,
    mut op: F,
) -> Result<T, LlmError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, VendorFailure>>,
{
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let failure = match op(attempts).await {
            Ok(value) => return Ok(value),
            Err(failure) => failure,
        };

        match classify(&failure) {
            FailureClass::ZeroQuota => {
                return Err(LlmError::Provider {
                    attempts,
                    message: format!(
                        "quota limit is zero for this key (not a transient rate limit): {}",
                        failure.message
                    ),
                });
            }
            FailureClass::Fatal => {
                return Err(LlmError::Provider {
                    attempts,
                    message: failure.message,
                });
            }
            FailureClass::Transient => {
                if attempts > policy.max_retries {
                    return Err(LlmError::Provider {
                        attempts,
                        message: format!("retries exhausted: {}", failure.message),
                    });
                }
                let delay = policy.delay_before(attempts);
                warn!(
                    provider,
                    attempt = attempts,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "transient LLM failure, retrying: {}",
                    failure.message
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn transient_only(_: &VendorFailure) -> FailureClass {
        FailureClass::Transient
    }

    fn by_status(failure: &VendorFailure) -> FailureClass {
        match failure.status {
            Some(429) => FailureClass::Transient,
            Some(403) if failure.message.contains("limit: 0") => FailureClass::ZeroQuota,
            _ => FailureClass::Fatal,
        }
    }

    fn instant_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::ZERO,
            backoff_factor: 2,
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_k_transient_failures_with_k_plus_one_attempts() {
        let calls = AtomicU32::new(0);
        let k = 2u32;

        let result = call_with_retry("test", instant_policy(3), transient_only, |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n <= k {
                    Err(VendorFailure::new(Some(429), "rate limited"))
                } else {
                    Ok("ok")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), k + 1);
    }

    #[tokio::test]
    async fn test_zero_quota_fails_without_retry() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = call_with_retry("test", instant_policy(3), by_status, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(VendorFailure::new(Some(403), "quota exceeded, limit: 0")) }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match err {
            LlmError::Provider { attempts, message } => {
                assert_eq!(attempts, 1);
                assert!(message.contains("quota limit is zero"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fatal_failure_surfaces_immediately() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = call_with_retry("test", instant_policy(3), by_status, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(VendorFailure::new(Some(401), "invalid api key")) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        match result.unwrap_err() {
            LlmError::Provider { attempts, message } => {
                assert_eq!(attempts, 1);
                assert!(message.contains("invalid api key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempt_count() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> =
            call_with_retry("test", instant_policy(2), transient_only, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(VendorFailure::new(Some(503), "unavailable")) }
            })
            .await;

        // 1 initial attempt + 2 retries.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result.unwrap_err() {
            LlmError::Provider { attempts, message } => {
                assert_eq!(attempts, 3);
                assert!(message.contains("retries exhausted"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_backoff_delays_are_exponential() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_before(2), Duration::from_millis(4000));
        assert_eq!(policy.delay_before(3), Duration::from_millis(8000));
    }
}
