//! Single-host adaptive throttle controller. Enabled on observed
//! rate-limit-like responses; grows on trigger, decays on sustained
//! non-triggering successes. Atomics plus a cooldown-gated adjustment,
//! the same shape as an adaptive concurrency limiter but applied to a
//! delay instead of a concurrency level.
//!
//! Delay grows by `STEP_MS` on every throttle-triggering status
//! observed, capped at `CAP_MS`; it decays by `STEP_MS` once
//! `DECAY_STREAK` consecutive non-triggering observations have been
//! seen, and the throttler disables itself once the delay decays back
//! to zero.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

const STEP_MS: u64 = 250;
const CAP_MS: u64 = 5_000;
const DECAY_STREAK: u32 = 3;

/// Status codes that signal the remote end is rate-limiting us. The CLI
/// collaborator may configure a different set; this is the default.
pub const DEFAULT_THROTTLE_STATUSES: &[u16] = &[429, 503];

pub struct ThrottlerState {
    enabled: AtomicBool,
    delay_ms: AtomicU64,
    consecutive_non_trigger: AtomicU32,
    throttle_statuses: Vec<u16>,
}

impl Default for ThrottlerState {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE_STATUSES.to_vec())
    }
}

impl ThrottlerState {
    pub fn new(throttle_statuses: Vec<u16>) -> Self {
        Self {
            enabled: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
            consecutive_non_trigger: AtomicU32::new(0),
            throttle_statuses,
        }
    }

    /// Feed one completed attempt's status. Advisory only — retries are
    /// independent of throttle state.
    pub fn observe_status(&self, status: u16) {
        if self.throttle_statuses.contains(&status) {
            self.enabled.store(true, Ordering::Relaxed);
            self.consecutive_non_trigger.store(0, Ordering::Relaxed);
            let cur = self.delay_ms.load(Ordering::Relaxed);
            self.delay_ms.store((cur + STEP_MS).min(CAP_MS), Ordering::Relaxed);
            return;
        }

        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        let streak = self.consecutive_non_trigger.fetch_add(1, Ordering::Relaxed) + 1;
        if streak >= DECAY_STREAK {
            self.consecutive_non_trigger.store(0, Ordering::Relaxed);
            let cur = self.delay_ms.load(Ordering::Relaxed);
            let next = cur.saturating_sub(STEP_MS);
            self.delay_ms.store(next, Ordering::Relaxed);
            if next == 0 {
                self.enabled.store(false, Ordering::Relaxed);
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn current_delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms.load(Ordering::Relaxed))
    }

    /// Block the calling thread for the throttler's current delay, if
    /// enabled. Called before every first-attempt send.
    pub fn wait_if_enabled(&self) {
        if self.is_enabled() {
            std::thread::sleep(self.current_delay());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disabled_with_zero_delay() {
        let t = ThrottlerState::default();
        assert!(!t.is_enabled());
        assert_eq!(t.current_delay(), Duration::ZERO);
    }

    #[test]
    fn trigger_status_enables_and_grows_delay() {
        let t = ThrottlerState::default();
        t.observe_status(429);
        assert!(t.is_enabled());
        assert_eq!(t.current_delay(), Duration::from_millis(STEP_MS));
        t.observe_status(429);
        assert_eq!(t.current_delay(), Duration::from_millis(STEP_MS * 2));
    }

    #[test]
    fn delay_caps_at_max() {
        let t = ThrottlerState::default();
        for _ in 0..(CAP_MS / STEP_MS + 10) {
            t.observe_status(429);
        }
        assert_eq!(t.current_delay(), Duration::from_millis(CAP_MS));
    }

    #[test]
    fn decays_after_sustained_non_trigger_and_eventually_disables() {
        let t = ThrottlerState::default();
        t.observe_status(429); // delay = 250ms, enabled
        for _ in 0..DECAY_STREAK {
            t.observe_status(200);
        }
        assert_eq!(t.current_delay(), Duration::ZERO);
        assert!(!t.is_enabled());
    }

    #[test]
    fn non_trigger_statuses_are_ignored_while_disabled() {
        let t = ThrottlerState::default();
        t.observe_status(200);
        t.observe_status(200);
        assert!(!t.is_enabled());
    }
}
