//! The structured output of the dry-run health harness: a snapshot of
//! latency percentiles, suppression rate, and drift status used to decide
//! whether a pipeline configuration is fit to go live.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStats {
    pub events_processed: usize,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
    pub suppression_rate: f64,
    pub mic_dead_events: usize,
    pub drift_warning: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub ready: bool,
    pub stats: HealthStats,
    pub warnings: Vec<String>,
}

impl HealthReport {
    /// 0 = READY. 1 = NOT READY, either because the pipeline itself
    /// reported not-ready, or because `fail_on_warning` is set and at
    /// least one warning was raised despite an otherwise-ready pipeline.
    pub fn exit_code(&self, fail_on_warning: bool) -> i32 {
        if !self.ready {
            1
        } else if fail_on_warning && !self.warnings.is_empty() {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> HealthStats {
        HealthStats {
            events_processed: 10,
            p50_ms: Some(100.0),
            p95_ms: Some(200.0),
            p99_ms: Some(250.0),
            suppression_rate: 0.0,
            mic_dead_events: 0,
            drift_warning: false,
        }
    }

    #[test]
    fn ready_with_no_warnings_exits_zero_regardless_of_flag() {
        let report = HealthReport {
            ready: true,
            stats: stats(),
            warnings: vec![],
        };
        assert_eq!(report.exit_code(false), 0);
        assert_eq!(report.exit_code(true), 0);
    }

    #[test]
    fn not_ready_always_exits_one() {
        let report = HealthReport {
            ready: false,
            stats: stats(),
            warnings: vec![],
        };
        assert_eq!(report.exit_code(false), 1);
        assert_eq!(report.exit_code(true), 1);
    }

    #[test]
    fn ready_with_warnings_only_fails_when_flag_is_set() {
        let report = HealthReport {
            ready: true,
            stats: stats(),
            warnings: vec!["p95 drift detected".into()],
        };
        assert_eq!(report.exit_code(false), 0);
        assert_eq!(report.exit_code(true), 1);
    }
}
