//! Drops the oldest pending trigger events once the Worker's inbound queue
//! backs up past a threshold, rather than letting latency compound for
//! every event behind it.

use std::collections::VecDeque;

use crate::model::SilenceTriggerEvent;

pub struct BackpressureController {
    threshold: usize,
}

impl BackpressureController {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// Given the current pending queue, drop the oldest entries until the
    /// queue is at or below `threshold`. Returns the dropped events (in the
    /// order they were dropped, oldest first) so the caller can emit a
    /// `SUPPRESSED_BACKPRESSURE` result for each.
    pub fn enforce(&self, pending: &mut VecDeque<SilenceTriggerEvent>) -> Vec<SilenceTriggerEvent> {
        let mut dropped = Vec::new();
        while pending.len() > self.threshold {
            if let Some(event) = pending.pop_front() {
                dropped.push(event);
            } else {
                break;
            }
        }
        dropped
    }
}
