//! Rolling latency history backing the p50/p95/p99 and suppression-rate
//! metrics surfaced in telemetry and the dry-run harness.

use std::collections::VecDeque;

use crate::model::{Decision, LatencyRecord};

const CAPACITY: usize = 50;

pub struct LatencyHistory {
    records: VecDeque<LatencyRecord>,
}

impl Default for LatencyHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyHistory {
    pub fn new() -> Self {
        Self {
            records: VecDeque::with_capacity(CAPACITY),
        }
    }

    pub fn record(&mut self, record: LatencyRecord) {
        if self.records.len() >= CAPACITY {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Percentile of `total_ms` across retained records. `p` is in `[0,100]`.
    /// Returns `None` on an empty history.
    pub fn percentile(&self, p: f64) -> Option<f64> {
        if self.records.is_empty() {
            return None;
        }
        let mut totals: Vec<f64> = self.records.iter().map(|r| r.total_ms).collect();
        totals.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let rank = ((p / 100.0) * (totals.len() as f64 - 1.0)).round() as usize;
        totals.get(rank.min(totals.len() - 1)).copied()
    }

    pub fn p50(&self) -> Option<f64> {
        self.percentile(50.0)
    }

    pub fn p95(&self) -> Option<f64> {
        self.percentile(95.0)
    }

    pub fn p99(&self) -> Option<f64> {
        self.percentile(99.0)
    }

    /// Fraction of retained records with a non-`Success` decision.
    pub fn suppression_rate(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let suppressed = self
            .records
            .iter()
            .filter(|r| r.decision.is_suppressed())
            .count();
        suppressed as f64 / self.records.len() as f64
    }

    /// Emits a `tracing` warning if p95 latency or the suppression rate
    /// exceed conservative operating bounds. Mirrors the original drift
    /// monitor's "don't alert on every sample, alert on the trend" stance.
    pub fn log_warnings(&self, max_latency_ms: f64) {
        if let Some(p95) = self.p95() {
            if p95 > max_latency_ms {
                tracing::warn!(p95, max_latency_ms, "p95 latency above budget");
            }
        }
        let rate = self.suppression_rate();
        if rate > 0.5 && self.len() >= 10 {
            tracing::warn!(suppression_rate = rate, "more than half of recent results suppressed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(total_ms: f64, decision: Decision) -> LatencyRecord {
        LatencyRecord {
            whisper_ms: total_ms * 0.8,
            intent_ms: total_ms * 0.1,
            total_ms,
            decision,
        }
    }

    #[test]
    fn empty_history_has_no_percentiles() {
        let history = LatencyHistory::new();
        assert!(history.p50().is_none());
        assert_eq!(history.suppression_rate(), 0.0);
    }

    #[test]
    fn percentiles_over_known_distribution() {
        let mut history = LatencyHistory::new();
        for ms in [100.0, 200.0, 300.0, 400.0, 500.0] {
            history.record(rec(ms, Decision::Success));
        }
        assert_eq!(history.p50(), Some(300.0));
    }

    #[test]
    fn caps_at_fifty_records() {
        let mut history = LatencyHistory::new();
        for i in 0..80 {
            history.record(rec(i as f64, Decision::Success));
        }
        assert_eq!(history.len(), 50);
    }

    #[test]
    fn suppression_rate_counts_non_success() {
        let mut history = LatencyHistory::new();
        history.record(rec(100.0, Decision::Success));
        history.record(rec(100.0, Decision::SuppressedLate));
        history.record(rec(100.0, Decision::SuppressedRepeat));
        history.record(rec(100.0, Decision::Success));
        assert_eq!(history.suppression_rate(), 0.5);
    }
}
