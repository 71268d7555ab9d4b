//! Retry backoff policy for the live tier.
//! One parameterized object shared by the single-text and batch paths:
//! rate-limited attempts wait `base * multiplier^attempt`, any other failure
//! waits the flat base delay. An optional jitter fraction spreads retries
//! from concurrent callers.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    /// Fraction of the computed delay added as jitter, in `[0, 1]`. Zero
    /// keeps waits deterministic.
    pub jitter: f64,
}

impl BackoffPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            multiplier,
            jitter: 0.0,
        }
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Batch path: 2 attempts, exponential from 3s on rate limits, flat 3s
    /// otherwise.
    pub fn batch() -> Self {
        Self::new(2, Duration::from_secs(3), 2.0)
    }

    /// Single-text path: 3 attempts, exponential from 2s on rate limits,
    /// flat 2s otherwise.
    pub fn single() -> Self {
        Self::new(3, Duration::from_secs(2), 2.0)
    }

    /// Delay before retrying after the given zero-based failed attempt.
    pub fn delay_for(&self, attempt: u32, rate_limited: bool) -> Duration {
        let base = if rate_limited {
            // 2^1, 2^2, ... of the base: the first retry already doubles.
            self.base_delay.mul_f64(self.multiplier.powi(attempt as i32 + 1))
        } else {
            self.base_delay
        };
        if self.jitter == 0.0 {
            return base;
        }
        // Jitter factor comes from the clock's subsecond nanos.
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos() as f64;
        let factor = 1.0 + self.jitter * (nanos / 1_000_000_000.0);
        base.mul_f64(factor)
    }

    /// Whether another attempt is allowed after `attempt` failures so far.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_delays_grow_exponentially() {
        let policy = BackoffPolicy::batch();
        assert_eq!(policy.delay_for(0, true), Duration::from_secs(6));
        assert_eq!(policy.delay_for(1, true), Duration::from_secs(12));
    }

    #[test]
    fn other_failures_wait_flat_base() {
        let policy = BackoffPolicy::batch();
        assert_eq!(policy.delay_for(0, false), Duration::from_secs(3));
        assert_eq!(policy.delay_for(1, false), Duration::from_secs(3));
    }

    #[test]
    fn single_path_uses_two_second_base() {
        let policy = BackoffPolicy::single();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_for(0, false), Duration::from_secs(2));
        assert_eq!(policy.delay_for(0, true), Duration::from_secs(4));
        assert_eq!(policy.delay_for(1, true), Duration::from_secs(8));
    }

    #[test]
    fn retry_budget_respects_max_attempts() {
        let policy = BackoffPolicy::batch();
        assert!(policy.should_retry(0));
        assert!(!policy.should_retry(1));
    }

    #[test]
    fn jitter_bounds_the_delay() {
        let policy = BackoffPolicy::new(3, Duration::from_secs(2), 2.0).with_jitter(0.5);
        let delay = policy.delay_for(0, false);
        assert!(delay >= Duration::from_secs(2));
        assert!(delay <= Duration::from_secs(3));
    }
}
