//! Async retry utilities with exponential backoff and jitter
//!
//! Retries run as a bounded loop: an attempt counter plus a delay schedule.
//! Nothing recurses, so the stack depth is constant regardless of attempts.

use std::time::Duration;

use rand::Rng;

/// Default maximum retry attempts for collaborator calls
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay in milliseconds for exponential backoff
pub const DEFAULT_BASE_DELAY_MS: u64 = 100;

/// Default upper bound for a single backoff delay
pub const DEFAULT_MAX_DELAY_MS: u64 = 5_000;

/// Retry schedule for collaborator calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay_ms: u64,
    /// Cap applied after exponential growth
    pub max_delay_ms: u64,
    /// Randomize half of each delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Policy with a single attempt
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Capped exponential delay before the attempt following `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let raw = self.base_delay_ms.saturating_mul(1u64 << exponent);
        Duration::from_millis(raw.min(self.max_delay_ms))
    }

    /// Delay with equal jitter: half fixed, half uniformly random.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let capped = self.backoff(attempt).as_millis() as u64;
        if !self.jitter || capped < 2 {
            return Duration::from_millis(capped);
        }
        let half = capped / 2;
        let spread = rand::thread_rng().gen_range(0..=half);
        Duration::from_millis(half + spread)
    }
}

/// Retry an async operation with exponential backoff.
///
/// `should_retry` decides whether an error is transient. Returns
/// `Ok((value, attempts))` on success, or `Err((error, attempts))` on failure.
pub async fn retry_with_backoff_async<F, Fut, T, E, R>(
    policy: &RetryPolicy,
    should_retry: R,
    mut operation: F,
) -> Result<(T, u32), (E, u32)>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match operation().await {
            Ok(value) => return Ok((value, attempts)),
            Err(e) => {
                if attempts >= max_attempts || !should_retry(&e) {
                    return Err((e, attempts));
                }
                let delay = policy.delay_for(attempts);
                tracing::warn!(
                    error = %e,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Retrying after transient error"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 4,
            jitter: true,
        }
    }

    #[tokio::test]
    async fn test_success_on_first_try() {
        let result =
            retry_with_backoff_async(&fast_policy(), |_| true, || async { Ok::<_, &str>(7) })
                .await;
        assert_eq!(result, Ok((7, 1)));
    }

    #[tokio::test]
    async fn test_success_after_retry() {
        let attempts = RefCell::new(0);
        let result = retry_with_backoff_async(
            &fast_policy(),
            |_| true,
            || {
                *attempts.borrow_mut() += 1;
                let current = *attempts.borrow();
                async move {
                    if current < 2 {
                        Err("transient error")
                    } else {
                        Ok(())
                    }
                }
            },
        )
        .await;
        assert_eq!(result, Ok(((), 2)));
    }

    #[tokio::test]
    async fn test_failure_after_max_retries() {
        let result = retry_with_backoff_async(
            &fast_policy(),
            |_| true,
            || async { Err::<(), _>("persistent error") },
        )
        .await;
        let (error, attempts) = result.unwrap_err();
        assert_eq!(error, "persistent error");
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let result = retry_with_backoff_async(
            &fast_policy(),
            |e: &&str| *e != "permanent",
            || async { Err::<(), _>("permanent") },
        )
        .await;
        assert_eq!(result, Err(("permanent", 1)));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay_ms: 100,
            max_delay_ms: 1_000,
            jitter: false,
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(5), Duration::from_millis(1_000));
        assert_eq!(policy.backoff(200), Duration::from_millis(1_000));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 10_000,
            jitter: true,
        };
        for _ in 0..50 {
            let delay = policy.delay_for(3).as_millis() as u64;
            assert!((200..=400).contains(&delay));
        }
    }

    #[test]
    fn test_no_retry_policy() {
        assert_eq!(RetryPolicy::no_retry().max_attempts, 1);
    }
}
