// Retry with exponential backoff for shipment service writes

use crate::service::ServiceError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// First backoff delay; later delays double from it
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 250,
            max_delay_ms: 5_000,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RetryHandler {
    config: RetryConfig,
}

impl RetryHandler {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Delays slept between attempts, one fewer than `max_attempts`.
    ///
    /// Doubles from `base_delay_ms` (rounded down to an even number of
    /// milliseconds) and caps at `max_delay_ms`. With jitter each delay is
    /// scaled by a random factor in `[0, 1)`.
    pub fn delays(&self) -> Vec<Duration> {
        let retries = self.config.max_attempts.saturating_sub(1) as usize;
        let backoff = ExponentialBackoff::from_millis(2)
            .factor((self.config.base_delay_ms / 2).max(1))
            .max_delay(Duration::from_millis(self.config.max_delay_ms))
            .take(retries);

        if self.config.jitter {
            backoff.map(jitter).collect()
        } else {
            backoff.collect()
        }
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error, or
    /// runs out of attempts. The last error is returned.
    pub async fn execute_with_retry<F, Fut, T>(
        &self,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let attempts = AtomicU32::new(0);

        let result = RetryIf::spawn(
            self.delays(),
            || {
                attempts.fetch_add(1, Ordering::Relaxed);
                operation()
            },
            |error: &ServiceError| {
                let attempt = attempts.load(Ordering::Relaxed);
                let retry = error.is_retryable() && attempt < max_attempts;
                if retry {
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts,
                        error = %error,
                        "Operation failed (retryable)"
                    );
                }
                retry
            },
        )
        .await;

        let attempt = attempts.load(Ordering::Relaxed);
        if result.is_ok() && attempt > 1 {
            debug!(operation = operation_name, attempt, "Operation succeeded after retry");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn no_jitter(max_attempts: u32) -> RetryHandler {
        RetryHandler::new(RetryConfig {
            max_attempts,
            base_delay_ms: 100,
            max_delay_ms: 1_000,
            jitter: false,
        })
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let handler = no_jitter(6);
        assert_eq!(
            handler.delays(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800),
                Duration::from_millis(1_000),
            ]
        );
    }

    #[test]
    fn test_single_attempt_has_no_delays() {
        assert!(RetryHandler::new(RetryConfig::none()).delays().is_empty());
    }

    #[test]
    fn test_jitter_never_exceeds_backoff() {
        let handler = RetryHandler::new(RetryConfig {
            jitter: true,
            ..RetryConfig::default()
        });
        for _ in 0..50 {
            let delays = handler.delays();
            assert_eq!(delays.len(), 2);
            assert!(delays[0] < Duration::from_millis(250));
            assert!(delays[1] < Duration::from_millis(500));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_success_after_failure() {
        let handler = no_jitter(3);
        let attempts = Arc::new(AtomicU32::new(0));

        let result = handler
            .execute_with_retry("update_shipment", || {
                let attempts = attempts.clone();
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ServiceError::Network {
                            message: "connection reset".to_string(),
                        })
                    } else {
                        Ok("synced")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "synced");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_fails_fast() {
        let handler = no_jitter(5);
        let attempts = Arc::new(AtomicU32::new(0));

        let result: Result<(), ServiceError> = handler
            .execute_with_retry("update_shipment", || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(ServiceError::NotFound { id: "SHP-404".into() })
                }
            })
            .await;

        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let handler = no_jitter(2);
        let attempts = Arc::new(AtomicU32::new(0));

        let result: Result<(), ServiceError> = handler
            .execute_with_retry("update_shipment", || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(ServiceError::Timeout { duration_ms: 3000 })
                }
            })
            .await;

        assert!(matches!(result, Err(ServiceError::Timeout { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
