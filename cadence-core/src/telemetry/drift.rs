//! Raises a drift warning when recent whisper-transcription latency trends
//! upward, independent of any single-event latency-budget breach.

use std::collections::VecDeque;

const WINDOW: usize = 20;

pub struct DriftDetector {
    threshold_ms: f64,
    samples: VecDeque<f64>,
}

impl DriftDetector {
    pub fn new(threshold_ms: f64) -> Self {
        Self {
            threshold_ms,
            samples: VecDeque::with_capacity(WINDOW),
        }
    }

    pub fn observe(&mut self, whisper_ms: f64) -> bool {
        if self.samples.len() >= WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(whisper_ms);
        self.p95_exceeds_threshold()
    }

    fn p95_exceeds_threshold(&self) -> bool {
        if self.samples.len() < WINDOW {
            return false;
        }
        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let idx = ((0.95 * (sorted.len() as f64 - 1.0)).round()) as usize;
        sorted[idx] > self.threshold_ms
    }
}
