use std::future::Future;
use std::time::Duration;

use log::{debug, warn};
use tokio::time::sleep;

use crate::config::TranscriptionConfig;
use crate::error::PipelineError;

/// Bounded retry with linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// `attempts` is clamped to at least one.
    pub fn new(attempts: u32, delay: Duration) -> Self {
        RetryPolicy {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// A single attempt
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn from_config(config: &TranscriptionConfig) -> Self {
        Self::new(
            config.retry_attempts,
            Duration::from_millis(config.retry_delay_ms),
        )
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Run `operation` until it succeeds or the attempts are used up,
    /// returning the last error.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, PipelineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        let mut attempt = 1;
        loop {
            debug!("Attempting {} (attempt {}/{})", label, attempt, self.attempts);

            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.attempts => {
                    warn!(
                        "{} failed (attempt {}/{}): {}",
                        label, attempt, self.attempts, e
                    );
                    let delay = self.delay * attempt;
                    debug!("Waiting {:?} before retry", delay);
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&TranscriptionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_single_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::none()
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(PipelineError::Transcription("boom".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        let result = policy
            .run("test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(PipelineError::Transcription(format!("attempt {}", n)))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_last_error() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(2, Duration::from_millis(10));
        let err = policy
            .run::<(), _, _>("test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(PipelineError::Transcription(format!("attempt {}", n)))
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Transcription failed: attempt 2");
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts(), 1);
    }
}
