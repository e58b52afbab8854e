//! Authentication retry schedule and the sleeper seam it runs on.

use std::time::Duration;

use async_trait::async_trait;

/// Default number of authentication attempts, including the first one.
pub const DEFAULT_AUTH_ATTEMPTS: u32 = 5;
/// Default delay before the second attempt; later delays double.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(5);

/// Exponential backoff schedule for authentication.
///
/// The delay after attempt `n` is `base * 2^(n-1)`. No delay is produced after
/// the final attempt.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use club_booking::domain::reservation_client::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.delay_after(1), Some(Duration::from_secs(5)));
/// assert_eq!(policy.delay_after(4), Some(Duration::from_secs(40)));
/// assert_eq!(policy.delay_after(5), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_AUTH_ATTEMPTS, DEFAULT_BACKOFF_BASE)
    }
}

impl RetryPolicy {
    /// Build a policy; at least one attempt is always made.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Same schedule with a different attempt budget.
    pub fn with_max_attempts(self, max_attempts: u32) -> Self {
        Self::new(max_attempts, self.base_delay)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay to wait after a failed `attempt` (1-based), or `None` when the
    /// attempt budget is spent.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        Some(self.base_delay.saturating_mul(factor))
    }
}

/// Async sleeping abstraction so retry tests run without wall-clock waits.
#[async_trait]
pub trait RetrySleeper: Send + Sync {
    /// Suspend the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Tokio-based sleeper.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl RetrySleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, Some(5))]
    #[case(2, Some(10))]
    #[case(3, Some(20))]
    #[case(4, Some(40))]
    #[case(5, None)]
    #[case(9, None)]
    fn default_schedule_doubles_until_the_last_attempt(
        #[case] attempt: u32,
        #[case] expected_secs: Option<u64>,
    ) {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_after(attempt),
            expected_secs.map(Duration::from_secs)
        );
    }

    #[rstest]
    fn zero_attempt_budget_still_allows_one_attempt() {
        let policy = RetryPolicy::default().with_max_attempts(0);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.delay_after(1), None);
    }

    #[rstest]
    fn large_attempt_numbers_saturate_instead_of_overflowing() {
        let policy = RetryPolicy::new(u32::MAX, Duration::from_secs(5));
        assert!(policy.delay_after(64).is_some());
    }
}
