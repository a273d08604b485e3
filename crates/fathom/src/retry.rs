//! Retry engine with thread-scoped configuration.
//!
//! Every action and assertion runs inside a [`Sequence`]: the action is tried,
//! and on failure retried after a delay until it succeeds or the configured
//! retry count is used up. A retry count of `N` means at most `N + 1`
//! attempts; `0` means a single attempt without any delay.
//!
//! ## Scoped configuration
//!
//! The active [`RetryConfig`] is thread-local. Each thread starts from
//! defaults read lazily from the environment (see [`crate::settings`]) and
//! can temporarily override them:
//!
//! ```
//! use fathom::retry::{self, Overrides};
//!
//! let tries = retry::with_config(Overrides::new().retry_count(0), || {
//!     retry::current().retry_count
//! });
//! assert_eq!(tries, 0);
//! ```
//!
//! Overrides are pushed onto a per-thread stack and popped by a guard, so
//! the previous configuration comes back even when the body panics or
//! returns early. Other threads never observe them.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::result::{Exhausted, FathomError, FathomResult};
use crate::settings::Settings;

/// Retry behavior for actions and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub retry_count: usize,
    /// Delay between attempts
    pub wait_after_fail: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for RetryConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            retry_count: settings.retry_count,
            wait_after_fail: settings.wait_after_fail,
        }
    }
}

impl RetryConfig {
    /// Create a retry config
    #[must_use]
    pub const fn new(retry_count: usize, wait_after_fail: Duration) -> Self {
        Self {
            retry_count,
            wait_after_fail,
        }
    }

    /// Single attempt, no delay
    #[must_use]
    pub const fn once() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Set the retry count
    #[must_use]
    pub const fn with_retry_count(mut self, retry_count: usize) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Set the delay between attempts
    #[must_use]
    pub const fn with_wait_after_fail(mut self, wait: Duration) -> Self {
        self.wait_after_fail = wait;
        self
    }

    /// Maximum number of attempts
    #[must_use]
    pub const fn max_attempts(&self) -> usize {
        self.retry_count + 1
    }
}

/// Fields to replace in the active configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    retry_count: Option<usize>,
    wait_after_fail: Option<Duration>,
}

impl Overrides {
    /// No overrides
    #[must_use]
    pub const fn new() -> Self {
        Self {
            retry_count: None,
            wait_after_fail: None,
        }
    }

    /// Replace the retry count
    #[must_use]
    pub const fn retry_count(mut self, retry_count: usize) -> Self {
        self.retry_count = Some(retry_count);
        self
    }

    /// Replace the delay between attempts
    #[must_use]
    pub const fn wait_after_fail(mut self, wait: Duration) -> Self {
        self.wait_after_fail = Some(wait);
        self
    }

    /// Copy of `base` with the requested fields replaced
    #[must_use]
    pub fn apply(&self, base: RetryConfig) -> RetryConfig {
        RetryConfig {
            retry_count: self.retry_count.unwrap_or(base.retry_count),
            wait_after_fail: self.wait_after_fail.unwrap_or(base.wait_after_fail),
        }
    }
}

impl From<RetryConfig> for Overrides {
    fn from(config: RetryConfig) -> Self {
        Self::new()
            .retry_count(config.retry_count)
            .wait_after_fail(config.wait_after_fail)
    }
}

thread_local! {
    static STACK: RefCell<Vec<RetryConfig>> = const { RefCell::new(Vec::new()) };
}

fn with_stack<R>(f: impl FnOnce(&mut Vec<RetryConfig>) -> R) -> R {
    STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        if stack.is_empty() {
            stack.push(RetryConfig::from(&Settings::from_env_or_default()));
        }
        f(&mut stack)
    })
}

/// Active configuration of the current thread
#[must_use]
pub fn current() -> RetryConfig {
    with_stack(|stack| stack.last().copied().unwrap_or_default())
}

/// Restores the previous configuration when dropped.
///
/// Not `Send`: a guard must be dropped on the thread that created it.
#[derive(Debug)]
#[must_use = "the override is reverted as soon as the guard is dropped"]
pub struct ScopeGuard {
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let depth = self.depth;
        with_stack(|stack| stack.truncate(depth));
    }
}

/// Install `overrides` on top of the active configuration until the
/// returned guard is dropped
pub fn scoped(overrides: impl Into<Overrides>) -> ScopeGuard {
    let overrides = overrides.into();
    let depth = with_stack(|stack| {
        let depth = stack.len();
        let base = stack.last().copied().unwrap_or_default();
        stack.push(overrides.apply(base));
        depth
    });
    ScopeGuard {
        depth,
        _not_send: PhantomData,
    }
}

/// Run `body` with `overrides` applied, restoring the previous
/// configuration afterwards
pub fn with_config<R>(overrides: impl Into<Overrides>, body: impl FnOnce() -> R) -> R {
    let _guard = scoped(overrides);
    body()
}

/// One bounded run of attempts
#[derive(Debug, Clone, Copy)]
pub struct Sequence {
    config: RetryConfig,
}

impl Default for Sequence {
    fn default() -> Self {
        Self::current()
    }
}

impl Sequence {
    /// Sequence with an explicit configuration
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Sequence using the thread's active configuration
    #[must_use]
    pub fn current() -> Self {
        Self::new(current())
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `action` until it succeeds or attempts are exhausted.
    ///
    /// `on_fail` sees every failed attempt, including the last one, along
    /// with its 1-based attempt number.
    ///
    /// # Errors
    ///
    /// Returns [`FathomError::RetryExhausted`] wrapping the last attempt's
    /// error when every attempt failed
    pub fn run<T, A, F>(&self, mut action: A, mut on_fail: F) -> FathomResult<T>
    where
        A: FnMut() -> FathomResult<T>,
        F: FnMut(&FathomError, usize),
    {
        let start = Instant::now();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match action() {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, "succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    on_fail(&err, attempt);
                    if attempt > self.config.retry_count {
                        debug!(attempts = attempt, "giving up: {err}");
                        return Err(
                            Exhausted::new(err, self.config.retry_count, start.elapsed()).into()
                        );
                    }
                    debug!(attempt, "attempt failed: {err}");
                    std::thread::sleep(self.config.wait_after_fail);
                }
            }
        }
    }
}

/// Run `action` under the active configuration
///
/// # Errors
///
/// Returns [`FathomError::RetryExhausted`] when every attempt failed
pub fn retry<T>(action: impl FnMut() -> FathomResult<T>) -> FathomResult<T> {
    Sequence::current().run(action, |_, _| {})
}

/// Run `action` under the active configuration, observing each failure
///
/// # Errors
///
/// Returns [`FathomError::RetryExhausted`] when every attempt failed
pub fn retry_with<T>(
    action: impl FnMut() -> FathomResult<T>,
    on_fail: impl FnMut(&FathomError, usize),
) -> FathomResult<T> {
    Sequence::current().run(action, on_fail)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast(retry_count: usize) -> Sequence {
        Sequence::new(RetryConfig::new(retry_count, Duration::ZERO))
    }

    mod retry_config {
        use super::*;

        #[test]
        fn test_default_matches_settings() {
            let config = RetryConfig::default();
            assert_eq!(config.retry_count, 3);
            assert_eq!(config.wait_after_fail, Duration::from_millis(300));
            assert_eq!(config.max_attempts(), 4);
        }

        #[test]
        fn test_once() {
            assert_eq!(RetryConfig::once().max_attempts(), 1);
        }

        #[test]
        fn test_overrides_apply() {
            let base = RetryConfig::new(3, Duration::from_millis(300));
            let applied = Overrides::new().retry_count(9).apply(base);
            assert_eq!(applied, RetryConfig::new(9, Duration::from_millis(300)));
            assert_eq!(Overrides::new().apply(base), base);
        }
    }

    mod sequence {
        use super::*;

        #[test]
        fn test_success_first_try() {
            let calls = AtomicUsize::new(0);
            let value = fast(3)
                .run(
                    || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(7)
                    },
                    |_, _| {},
                )
                .unwrap();
            assert_eq!(value, 7);
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }

        #[test]
        fn test_always_failing_runs_n_plus_one_times() {
            for n in [0, 1, 4] {
                let calls = AtomicUsize::new(0);
                let err = fast(n)
                    .run(
                        || -> FathomResult<()> {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Err(FathomError::backend("click", "boom"))
                        },
                        |_, _| {},
                    )
                    .unwrap_err();
                assert_eq!(calls.load(Ordering::SeqCst), n + 1);
                assert_eq!(err.attempts(), Some(n + 1));
                assert!(err.to_string().contains(&format!("after {n} retries")));
            }
        }

        #[test]
        fn test_eventual_success() {
            let calls = AtomicUsize::new(0);
            let result = fast(5).run(
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(FathomError::backend("read", "not yet"))
                    } else {
                        Ok(n)
                    }
                },
                |_, _| {},
            );
            assert_eq!(result.unwrap(), 3);
        }

        #[test]
        fn test_on_fail_sees_every_failure() {
            let mut seen = Vec::new();
            let _ = fast(2).run(
                || -> FathomResult<()> { Err(FathomError::assertion("no")) },
                |_, attempt| seen.push(attempt),
            );
            assert_eq!(seen, vec![1, 2, 3]);
        }

        #[test]
        fn test_zero_retries_does_not_sleep() {
            let sequence = Sequence::new(RetryConfig::new(0, Duration::from_secs(10)));
            let start = Instant::now();
            let _ = sequence.run(|| -> FathomResult<()> { Err(FathomError::assertion("x")) }, |_, _| {});
            assert!(start.elapsed() < Duration::from_secs(5));
        }

        #[test]
        fn test_waits_between_attempts() {
            let sequence = Sequence::new(RetryConfig::new(2, Duration::from_millis(20)));
            let err = sequence
                .run(|| -> FathomResult<()> { Err(FathomError::assertion("x")) }, |_, _| {})
                .unwrap_err();
            assert!(err.exhausted().unwrap().elapsed >= Duration::from_millis(40));
        }

        #[test]
        fn test_exhaustion_keeps_last_cause() {
            let calls = AtomicUsize::new(0);
            let err = fast(1)
                .run(
                    || -> FathomResult<()> {
                        let n = calls.fetch_add(1, Ordering::SeqCst);
                        Err(FathomError::assertion(format!("attempt {n}")))
                    },
                    |_, _| {},
                )
                .unwrap_err();
            assert_eq!(err.root_cause().to_string(), "attempt 1");
        }
    }

    mod scoping {
        use super::*;

        #[test]
        fn test_with_config_overrides_and_restores() {
            let before = current();
            let inside = with_config(Overrides::new().retry_count(42), current);
            assert_eq!(inside.retry_count, 42);
            assert_eq!(inside.wait_after_fail, before.wait_after_fail);
            assert_eq!(current(), before);
        }

        #[test]
        fn test_nested_scopes() {
            let before = current();
            with_config(Overrides::new().retry_count(1), || {
                with_config(Overrides::new().wait_after_fail(Duration::ZERO), || {
                    assert_eq!(current(), RetryConfig::new(1, Duration::ZERO));
                });
                assert_eq!(current().retry_count, 1);
                assert_eq!(current().wait_after_fail, before.wait_after_fail);
            });
            assert_eq!(current(), before);
        }

        #[test]
        fn test_restored_after_panic() {
            let before = current();
            let result = std::panic::catch_unwind(|| {
                with_config(Overrides::new().retry_count(99), || {
                    panic!("body failed");
                })
            });
            assert!(result.is_err());
            assert_eq!(current(), before);
        }

        #[test]
        fn test_restored_after_error_return() {
            let before = current();
            let result: FathomResult<()> = with_config(Overrides::new().retry_count(7), || {
                Err(FathomError::assertion("early"))
            });
            assert!(result.is_err());
            assert_eq!(current(), before);
        }

        #[test]
        fn test_guard_out_of_order_drop() {
            let before = current();
            let outer = scoped(Overrides::new().retry_count(1));
            let inner = scoped(Overrides::new().retry_count(2));
            drop(outer);
            assert_eq!(current(), before);
            drop(inner);
            assert_eq!(current(), before);
        }

        #[test]
        fn test_override_does_not_leak_across_threads() {
            let seen = Arc::new(AtomicUsize::new(usize::MAX));
            let _guard = scoped(Overrides::new().retry_count(77));
            let seen_in_thread = Arc::clone(&seen);
            std::thread::spawn(move || {
                seen_in_thread.store(current().retry_count, Ordering::SeqCst);
            })
            .join()
            .unwrap();
            assert_ne!(seen.load(Ordering::SeqCst), 77);
            assert_eq!(current().retry_count, 77);
        }

        #[test]
        fn test_retry_uses_active_config() {
            let calls = AtomicUsize::new(0);
            let result = with_config(RetryConfig::new(2, Duration::ZERO), || {
                retry(|| -> FathomResult<()> {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(FathomError::assertion("x"))
                })
            });
            assert!(result.is_err());
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }
    }
}
