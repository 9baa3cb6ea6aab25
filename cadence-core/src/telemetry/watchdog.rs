//! Flags any event still in flight longer than the configured timeout.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use uuid::Uuid;

pub struct Watchdog {
    timeout: Duration,
    in_flight: HashMap<Uuid, Instant>,
}

impl Watchdog {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            in_flight: HashMap::new(),
        }
    }

    pub fn start(&mut self, event_id: Uuid, now: Instant) {
        self.in_flight.insert(event_id, now);
    }

    pub fn finish(&mut self, event_id: Uuid) {
        self.in_flight.remove(&event_id);
    }

    /// Returns the ids of every still-tracked event that has exceeded the
    /// timeout as of `now`, without removing them (the caller decides
    /// whether to also call `finish`).
    pub fn overdue(&self, now: Instant) -> Vec<Uuid> {
        self.in_flight
            .iter()
            .filter(|(_, started)| now.saturating_duration_since(**started) > self.timeout)
            .map(|(id, _)| *id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_under_timeout_is_not_overdue() {
        let mut wd = Watchdog::new(Duration::from_secs(2));
        let id = Uuid::new_v4();
        let t0 = Instant::now();
        wd.start(id, t0);
        assert!(wd.overdue(t0 + Duration::from_millis(500)).is_empty());
    }

    #[test]
    fn event_past_timeout_is_overdue() {
        let mut wd = Watchdog::new(Duration::from_secs(2));
        let id = Uuid::new_v4();
        let t0 = Instant::now();
        wd.start(id, t0);
        assert_eq!(wd.overdue(t0 + Duration::from_secs(3)), vec![id]);
    }

    #[test]
    fn finish_removes_from_tracking() {
        let mut wd = Watchdog::new(Duration::from_secs(2));
        let id = Uuid::new_v4();
        let t0 = Instant::now();
        wd.start(id, t0);
        wd.finish(id);
        assert!(wd.overdue(t0 + Duration::from_secs(5)).is_empty());
    }
}
