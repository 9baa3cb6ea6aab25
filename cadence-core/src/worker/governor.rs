//! Final decision authority for one worker pass: late, safe-mode, repeat,
//! or success — in that precedence order.
//!
//! Back-pressure is handled earlier, before STT even runs (see
//! [`super::Worker`]), so it never reaches the governor.

use std::time::Duration;

use crate::model::Decision;

pub struct GovernorService {
    max_latency: Duration,
}

impl GovernorService {
    pub fn new(max_latency: Duration) -> Self {
        Self { max_latency }
    }

    /// `event_age`: wall-clock time since the triggering event was created.
    /// `safe_mode`: whether the worker has tripped into degraded mode after
    /// repeated STT failures. `is_repeat`: whether the anti-repeat cache
    /// flagged this (prompt_id, score) as a near-duplicate of a recent one.
    pub fn decide(&self, event_age: Duration, safe_mode: bool, is_repeat: bool) -> Decision {
        if event_age > self.max_latency {
            Decision::SuppressedLate
        } else if safe_mode {
            Decision::SuppressedSafeMode
        } else if is_repeat {
            Decision::SuppressedRepeat
        } else {
            Decision::Success
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn governor() -> GovernorService {
        GovernorService::new(Duration::from_millis(1500))
    }

    #[test]
    fn late_event_is_suppressed_regardless_of_other_flags() {
        let g = governor();
        let d = g.decide(Duration::from_millis(1600), true, true);
        assert_eq!(d, Decision::SuppressedLate);
    }

    #[test]
    fn safe_mode_outranks_repeat() {
        let g = governor();
        let d = g.decide(Duration::from_millis(500), true, true);
        assert_eq!(d, Decision::SuppressedSafeMode);
    }

    #[test]
    fn repeat_suppresses_when_not_late_or_safe_mode() {
        let g = governor();
        let d = g.decide(Duration::from_millis(500), false, true);
        assert_eq!(d, Decision::SuppressedRepeat);
    }

    #[test]
    fn clean_event_succeeds() {
        let g = governor();
        let d = g.decide(Duration::from_millis(500), false, false);
        assert_eq!(d, Decision::Success);
    }

    #[test]
    fn event_exactly_at_budget_is_not_late() {
        let g = governor();
        let d = g.decide(Duration::from_millis(1500), false, false);
        assert_eq!(d, Decision::Success, "boundary is inclusive of the budget");
    }
}
