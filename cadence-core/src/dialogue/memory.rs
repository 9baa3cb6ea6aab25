//! Short rolling memory of recent intents and suggestions, used both by the
//! state machine (inactivity reset) and the suggestion engine (avoid
//! repeating a recent suggestion).

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Bounded history of the last `capacity` intents and suggestions, which
/// clears itself the moment it is accessed after sitting idle for longer
/// than `reset_after`.
pub struct RollingMemory {
    capacity: usize,
    reset_after: Duration,
    intents: VecDeque<String>,
    suggestions: VecDeque<String>,
    last_access: Instant,
}

impl RollingMemory {
    pub fn new(capacity: usize, reset_after: Duration) -> Self {
        Self {
            capacity,
            reset_after,
            intents: VecDeque::with_capacity(capacity),
            suggestions: VecDeque::with_capacity(capacity),
            last_access: Instant::now(),
        }
    }

    /// Reset-before-access: if more than `reset_after` has elapsed since the
    /// last touch, clear both histories first. The access timestamp is then
    /// always refreshed, whether or not a reset happened.
    fn maybe_reset(&mut self, now: Instant) -> bool {
        let idle = now.saturating_duration_since(self.last_access);
        let reset = idle > self.reset_after;
        if reset {
            self.intents.clear();
            self.suggestions.clear();
        }
        self.last_access = now;
        reset
    }

    /// Record one (intent, suggestion) pair observed at `now`. Returns
    /// `true` if the memory was reset for inactivity before recording.
    pub fn record(&mut self, intent: &str, suggestion: &str, now: Instant) -> bool {
        let reset = self.maybe_reset(now);
        push_capped(&mut self.intents, intent.to_string(), self.capacity);
        push_capped(&mut self.suggestions, suggestion.to_string(), self.capacity);
        reset
    }

    /// Whether `suggestion` appears in recent memory, applying the
    /// reset-before-access rule first.
    pub fn recalls_suggestion(&mut self, suggestion: &str, now: Instant) -> bool {
        self.maybe_reset(now);
        self.suggestions.iter().any(|s| s == suggestion)
    }

    pub fn recent_intents(&mut self, now: Instant) -> Vec<String> {
        self.maybe_reset(now);
        self.intents.iter().cloned().collect()
    }

    pub fn force_reset(&mut self, now: Instant) {
        self.intents.clear();
        self.suggestions.clear();
        self.last_access = now;
    }
}

fn push_capped(deque: &mut VecDeque<String>, value: String, capacity: usize) {
    if deque.len() >= capacity {
        deque.pop_front();
    }
    deque.push_back(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_stay_under_capacity() {
        let mut mem = RollingMemory::new(3, Duration::from_secs(90));
        let t0 = Instant::now();
        for i in 0..5 {
            mem.record(&format!("intent{i}"), &format!("sug{i}"), t0);
        }
        assert_eq!(mem.recent_intents(t0).len(), 3);
    }

    #[test]
    fn recalls_recent_suggestion() {
        let mut mem = RollingMemory::new(5, Duration::from_secs(90));
        let t0 = Instant::now();
        mem.record("pain_signal", "ask about budget", t0);
        assert!(mem.recalls_suggestion("ask about budget", t0));
        assert!(!mem.recalls_suggestion("ask about timeline", t0));
    }

    #[test]
    fn idle_past_reset_window_clears_before_access() {
        let mut mem = RollingMemory::new(5, Duration::from_millis(10));
        let t0 = Instant::now();
        mem.record("pain_signal", "ask about budget", t0);
        let t1 = t0 + Duration::from_millis(50);
        assert!(
            !mem.recalls_suggestion("ask about budget", t1),
            "memory must reset before the stale access is served"
        );
    }

    #[test]
    fn record_reports_whether_it_reset() {
        let mut mem = RollingMemory::new(5, Duration::from_millis(10));
        let t0 = Instant::now();
        assert!(!mem.record("a", "s", t0), "first record is not a reset");
        let t1 = t0 + Duration::from_millis(50);
        assert!(mem.record("b", "t", t1), "stale gap must report a reset");
    }
}
