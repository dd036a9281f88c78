//! Exponential backoff shared by the Deck fetch and the Discord post.

use std::future::Future;
use std::time::Duration;

use deck::DeckError;
use notify::ChannelError;
use tracing::warn;

/// Errors that know whether another attempt is worthwhile.
pub trait Retryable {
    /// Whether the failed operation may succeed if repeated.
    fn is_retryable(&self) -> bool;

    /// Minimum wait requested by the remote side, if any.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl Retryable for DeckError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}

impl Retryable for ChannelError {
    fn is_retryable(&self) -> bool {
        ChannelError::is_retryable(self)
    }

    fn retry_after(&self) -> Option<Duration> {
        self.retry_after_secs().map(Duration::from_secs)
    }
}

/// Retry configuration for outbound calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Same backoff shape with a different attempt budget.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Delay after the given failed attempt (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let mut delay = self.initial_delay;
        for _ in 1..attempt {
            delay = self.next_delay(delay);
            if delay >= self.max_delay {
                break;
            }
        }
        delay.min(self.max_delay)
    }

    fn next_delay(&self, delay: Duration) -> Duration {
        std::cmp::min(
            self.max_delay,
            Duration::from_secs_f64(delay.as_secs_f64() * self.backoff_multiplier),
        )
    }

    /// Wait before the next attempt: the backoff delay, raised to a
    /// server-requested minimum, never above `max_delay`.
    #[must_use]
    pub fn wait_after(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let delay = self.delay_after(attempt);
        retry_after
            .map_or(delay, |after| after.max(delay))
            .min(self.max_delay)
    }
}

/// Execute an async operation with retry logic.
///
/// Stops early on errors that are not [`Retryable::is_retryable`]. Returns the
/// final result together with the number of attempts made.
pub async fn with_retry_async<T, E, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut f: F,
) -> (Result<T, E>, u32)
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match f().await {
            Ok(result) => return (Ok(result), attempt),
            Err(e) => {
                if !e.is_retryable() || attempt >= max_attempts {
                    return (Err(e), attempt);
                }

                let wait = config.wait_after(attempt, e.retry_after());

                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    retry_in_ms = wait.as_millis() as u64,
                    error = %e,
                    "Operation failed, retrying"
                );

                tokio::time::sleep(wait).await;
            }
        }
    }
}
