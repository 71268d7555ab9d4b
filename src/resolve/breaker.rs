//! Circuit breaker guarding the live translation tier.
//! Two states only: Closed and Open. The breaker opens once the failure
//! count reaches the threshold and closes again after the cooldown has
//! elapsed since the last failure, resetting the count to zero. A single
//! success re-arms it fully; there is no half-open trial phase, so the
//! first call after cooldown is a full-trust retry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Failures before the breaker opens.
pub const DEFAULT_THRESHOLD: u32 = 5;

/// Cooldown before an open breaker allows traffic again.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5 * 60);

#[derive(Default)]
struct BreakerState {
    failures: u32,
    last_failure: Option<Instant>,
    open: bool,
}

pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    threshold: u32,
    cooldown: Duration,
    /// Manual override: when set, `allow` is false regardless of state.
    offline: AtomicBool,
}

/// Snapshot for operational introspection.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BreakerStatus {
    pub open: bool,
    pub failures: u32,
    pub offline: bool,
    pub cooldown_remaining_secs: u64,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            threshold,
            cooldown,
            offline: AtomicBool::new(false),
        }
    }

    /// Whether a live call may proceed. An open breaker whose cooldown has
    /// elapsed is reset here, on the read path.
    pub fn allow(&self) -> bool {
        if self.offline.load(Ordering::Relaxed) {
            return false;
        }
        let mut state = self.state.lock();
        if !state.open {
            return true;
        }
        match state.last_failure {
            Some(at) if at.elapsed() > self.cooldown => {
                state.open = false;
                state.failures = 0;
                info!("circuit breaker reset after cooldown, live tier re-enabled");
                true
            }
            _ => false,
        }
    }

    pub fn record_failure(&self) {
        let mut state = self.state.lock();
        state.failures += 1;
        state.last_failure = Some(Instant::now());
        if state.failures >= self.threshold && !state.open {
            state.open = true;
            warn!(failures = state.failures, "circuit breaker opened, live tier disabled");
        }
    }

    /// Any success fully re-arms the breaker.
    pub fn record_success(&self) {
        let mut state = self.state.lock();
        if state.open || state.failures > 0 {
            debug!("circuit breaker re-armed by success");
        }
        state.failures = 0;
        state.open = false;
    }

    /// Manual reset, clearing the failure history entirely.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.failures = 0;
        state.open = false;
        state.last_failure = None;
        info!("circuit breaker manually reset");
    }

    /// Force all resolutions to skip the live tier without waiting for
    /// failures to accumulate.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
        info!(offline, "offline mode toggled");
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Relaxed)
    }

    pub fn status(&self) -> BreakerStatus {
        let state = self.state.lock();
        let remaining = if state.open {
            state
                .last_failure
                .map(|at| self.cooldown.saturating_sub(at.elapsed()).as_secs())
                .unwrap_or(0)
        } else {
            0
        };
        BreakerStatus {
            open: state.open,
            failures: state.failures,
            offline: self.offline.load(Ordering::Relaxed),
            cooldown_remaining_secs: remaining,
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_COOLDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn stays_closed_below_threshold() {
        let breaker = CircuitBreaker::new(5, DEFAULT_COOLDOWN);
        for _ in 0..4 {
            breaker.record_failure();
            assert!(breaker.allow());
        }
        assert_eq!(breaker.status().failures, 4);
    }

    #[test]
    fn opens_at_threshold() {
        let breaker = CircuitBreaker::new(5, DEFAULT_COOLDOWN);
        for _ in 0..5 {
            breaker.record_failure();
        }
        assert!(!breaker.allow());
        assert!(breaker.status().open);
    }

    #[test]
    fn cooldown_elapsed_resets_state() {
        let breaker = CircuitBreaker::new(2, Duration::from_millis(30));
        breaker.record_failure();
        breaker.record_failure();
        assert!(!breaker.allow());

        thread::sleep(Duration::from_millis(50));

        assert!(breaker.allow());
        let status = breaker.status();
        assert!(!status.open);
        assert_eq!(status.failures, 0);
    }

    #[test]
    fn single_success_fully_rearms() {
        let breaker = CircuitBreaker::new(3, DEFAULT_COOLDOWN);
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
        // Count restarts from zero: three more failures needed to open.
        breaker.record_failure();
        breaker.record_failure();
        assert!(breaker.allow());
        breaker.record_failure();
        assert!(!breaker.allow());
    }

    #[test]
    fn reopening_restarts_cooldown_from_new_failure() {
        let breaker = CircuitBreaker::new(1, Duration::from_millis(40));
        breaker.record_failure();
        assert!(!breaker.allow());

        thread::sleep(Duration::from_millis(60));
        assert!(breaker.allow());

        // The full-trust retry fails: breaker reopens, cooldown restarts.
        breaker.record_failure();
        assert!(!breaker.allow());
    }

    #[test]
    fn offline_mode_overrides_closed_breaker() {
        let breaker = CircuitBreaker::default();
        assert!(breaker.allow());
        breaker.set_offline(true);
        assert!(!breaker.allow());
        assert!(breaker.status().offline);
        breaker.set_offline(false);
        assert!(breaker.allow());
    }

    #[test]
    fn manual_reset_clears_everything() {
        let breaker = CircuitBreaker::new(1, DEFAULT_COOLDOWN);
        breaker.record_failure();
        assert!(!breaker.allow());
        breaker.reset();
        assert!(breaker.allow());
        assert_eq!(breaker.status().failures, 0);
    }
}
