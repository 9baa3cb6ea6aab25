//! Flags low-confidence successful classifications without suppressing
//! them — a `Decision::Success` result can still be worth a quiet warning
//! if the winning prompt barely beat the rest.

const DEFAULT_THRESHOLD: f32 = 0.2;

pub struct PromptQualityMonitor {
    threshold: f32,
}

impl Default for PromptQualityMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl PromptQualityMonitor {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Logs `PROMPT_QUALITY_LOW` when `score` is below threshold. Returns
    /// whether the score cleared the bar — purely informational, never a
    /// suppression signal (the governor has already decided `Success`).
    pub fn evaluate(&self, prompt_id: &str, score: f32) -> bool {
        if score < self.threshold {
            tracing::warn!(prompt_id, score, event = "PROMPT_QUALITY_LOW", "low-confidence prompt match");
            false
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_above_threshold_passes() {
        let monitor = PromptQualityMonitor::default();
        assert!(monitor.evaluate("3", 0.82));
    }

    #[test]
    fn score_below_threshold_is_flagged() {
        let monitor = PromptQualityMonitor::default();
        assert!(!monitor.evaluate("", 0.0));
    }

    #[test]
    fn custom_threshold_is_honored() {
        let monitor = PromptQualityMonitor::new(0.5);
        assert!(!monitor.evaluate("1", 0.3));
        assert!(monitor.evaluate("1", 0.6));
    }
}
