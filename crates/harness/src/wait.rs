//! Bounded polling
//!
//! The single place where the harness waits for the UI to catch up with an
//! action. Conditions are re-evaluated at a fixed interval until they yield
//! a value or the timeout elapses. Errors raised while evaluating a
//! condition are treated as "not yet" and retried.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::trace;

use crate::error::{HarnessError, HarnessResult};

/// Default bound for locating an element (10 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default polling interval (500ms)
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl WaitPolicy {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    pub fn with_interval(self, interval: Duration) -> Self {
        Self { interval, ..self }
    }

    /// Required wait: the value produced by `condition`, or
    /// [`HarnessError::Timeout`].
    ///
    /// A zero timeout fails immediately without evaluating the condition.
    pub async fn until<T, F, Fut>(&self, what: &str, mut condition: F) -> HarnessResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = HarnessResult<Option<T>>>,
    {
        let start = Instant::now();
        if self.timeout.is_zero() {
            return Err(HarnessError::Timeout {
                what: what.to_string(),
                elapsed_ms: 0,
            });
        }

        let deadline = start + self.timeout;
        let mut attempts: u32 = 0;
        let mut last_error: Option<String> = None;

        loop {
            attempts += 1;
            match condition().await {
                Ok(Some(value)) => {
                    trace!(what, attempts, "condition met");
                    return Ok(value);
                }
                Ok(None) => {}
                Err(e) => {
                    trace!(what, attempts, error = %e, "condition errored, retrying");
                    last_error = Some(e.to_string());
                }
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            sleep(self.interval.min(deadline - now)).await;
        }

        let what = match last_error {
            Some(e) => format!("{} (last error: {})", what, e),
            None => what.to_string(),
        };
        Err(HarnessError::Timeout {
            what,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Probe: like [`WaitPolicy::until`] but a timeout is simply `None`.
    pub async fn probe<T, F, Fut>(&self, what: &str, condition: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = HarnessResult<Option<T>>>,
    {
        self.until(what, condition).await.ok()
    }

    /// Boolean probe over a predicate.
    pub async fn holds<F, Fut>(&self, what: &str, mut predicate: F) -> bool
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = HarnessResult<bool>>,
    {
        self.probe(what, || {
            let fut = predicate();
            async move { fut.await.map(|ok| ok.then_some(())) }
        })
        .await
        .is_some()
    }
}

/// Poll `predicate` every `interval` until it holds or `timeout` elapses.
pub async fn await_condition<F, Fut>(predicate: F, timeout: Duration, interval: Duration) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = HarnessResult<bool>>,
{
    WaitPolicy::new(timeout, interval)
        .holds("condition", predicate)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_returns_immediately() {
        let calls = Cell::new(0);
        let start = Instant::now();
        let held = await_condition(
            || {
                calls.set(calls.get() + 1);
                async { Ok(true) }
            },
            Duration::ZERO,
            Duration::from_millis(100),
        )
        .await;

        assert!(!held);
        assert_eq!(calls.get(), 0);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_yields_value_after_retries() {
        let calls = Cell::new(0u32);
        let policy = WaitPolicy::new(Duration::from_secs(5), Duration::from_millis(250));
        let value = policy
            .until("third attempt", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { Ok((n >= 3).then_some(n * 10)) }
            })
            .await
            .unwrap();

        assert_eq!(value, 30);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_are_swallowed_until_timeout() {
        let calls = Cell::new(0u32);
        let start = Instant::now();
        let policy = WaitPolicy::new(Duration::from_secs(2), Duration::from_millis(500));
        let err = policy
            .until::<(), _, _>("stale row", || {
                calls.set(calls.get() + 1);
                async { Err(HarnessError::StaleElement("row".into())) }
            })
            .await
            .unwrap_err();

        // evaluated at 0, 500, 1000, 1500 and 2000 ms
        assert_eq!(calls.get(), 5);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
        match err {
            HarnessError::Timeout { what, elapsed_ms } => {
                assert!(what.contains("stale row"));
                assert!(what.contains("Stale element reference: row"));
                assert_eq!(elapsed_ms, 2000);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_then_success() {
        let calls = Cell::new(0u32);
        let policy = WaitPolicy::new(Duration::from_secs(1), Duration::from_millis(100));
        let held = policy
            .holds("flaky", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n == 1 {
                        Err(HarnessError::NotFound("menu".into()))
                    } else {
                        Ok(true)
                    }
                }
            })
            .await;
        assert!(held);
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_never_overshoots_deadline() {
        let start = Instant::now();
        let policy = WaitPolicy::new(Duration::from_millis(700), Duration::from_millis(500));
        let found = policy
            .probe::<(), _, _>("never", || async { Ok(None) })
            .await;
        assert!(found.is_none());
        assert_eq!(start.elapsed(), Duration::from_millis(700));
    }
}
