//! Exponential backoff with jitter for calls to the spreadsheet API.

use std::{future::Future, time::Duration};

use log::warn;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 500,
            max_delay_ms: 16_000,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based), without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        let millis = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(millis)
    }

    /// Base delay plus up to a quarter of it at random.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        base + base.mul_f64(rand::random::<f64>() * 0.25)
    }

    /// Runs `op` until it succeeds, fails with an error `is_transient` rejects,
    /// or attempts run out. The last error is returned.
    pub async fn run<T, E, F, Fut>(
        &self,
        what: &str,
        is_transient: impl Fn(&E) -> bool,
        mut op: F,
    ) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && is_transient(&e) => {
                    let delay = self.delay(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        what, attempt, self.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 2,
        }
    }

    #[test]
    fn delay_doubles_until_cap() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay_ms: 100,
            max_delay_ms: 1_000,
        };

        assert_eq!(policy.base_delay(1), Duration::from_millis(100));
        assert_eq!(policy.base_delay(3), Duration::from_millis(400));
        assert_eq!(policy.base_delay(8), Duration::from_millis(1_000));

        let jittered = policy.delay(2);
        assert!(jittered >= Duration::from_millis(200));
        assert!(jittered <= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn transient_errors_are_retried() {
        let calls = &AtomicU32::new(0);

        let result: Result<u32, String> = fast(4)
            .run("flaky", |_| true, || async move {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 | 1 => Err("503".to_owned()),
                    n => Ok(n),
                }
            })
            .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_fail_fast() {
        let calls = &AtomicU32::new(0);

        let result: Result<(), String> = fast(4)
            .run("bad request", |e: &String| e != "400", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("400".to_owned())
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn attempts_are_capped() {
        let calls = &AtomicU32::new(0);

        let result: Result<(), String> = fast(3)
            .run("down", |_| true, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("500".to_owned())
            })
            .await;

        assert_eq!(result, Err("500".to_owned()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
