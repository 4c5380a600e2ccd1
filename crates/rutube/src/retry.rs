use std::{future::Future, num::NonZeroU32, time::Duration};

use serde::Deserialize;

use crate::error::{RutubeError, RutubeResult};

/// Fixed-delay retry policy for fallible network operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    pub attempts: NonZeroU32,
    /// Delay between two attempts, in milliseconds.
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: Self::DEFAULT_ATTEMPTS,
            delay_ms: 500,
        }
    }
}

impl RetryConfig {
    pub const DEFAULT_ATTEMPTS: NonZeroU32 = NonZeroU32::new(3).unwrap();

    /// The operation always runs at least once, `attempts` of 0 counts as 1.
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN),
            delay_ms: delay.as_millis() as u64,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Runs `operation` and retries it on connection errors.
    ///
    /// Once all attempts are used up, the error built by `exhausted` is returned
    /// instead of the last connection error.
    pub async fn run<T, F, Fut, E>(&self, operation: F, exhausted: E) -> RutubeResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RutubeResult<T>>,
        E: FnOnce() -> RutubeError,
    {
        self.run_if(operation, RutubeError::is_connection_error, exhausted)
            .await
    }

    /// Same as [`RetryConfig::run`], with a custom predicate selecting retry-eligible errors.
    ///
    /// Errors rejected by `should_retry` are returned immediately.
    pub async fn run_if<T, F, Fut, P, E>(
        &self,
        mut operation: F,
        should_retry: P,
        exhausted: E,
    ) -> RutubeResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RutubeResult<T>>,
        P: Fn(&RutubeError) -> bool,
        E: FnOnce() -> RutubeError,
    {
        let delay = self.delay();
        let attempts = self.attempts.get();
        for attempt in 1..=attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if should_retry(&e) => {
                    if attempt == attempts {
                        log::warn!("Connection error: {e} - no attempts left ({attempt}/{attempts}).");
                        break;
                    }
                    log::warn!(
                        "Connection error: {e} - retrying in {delay:?} ({attempt}/{attempts})."
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(exhausted())
    }
}
