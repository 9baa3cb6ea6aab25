//! Hysteresis smoothing over a raw per-frame speech score.
//!
//! A single noisy frame score should not flip the Sentinel's speaking state
//! back and forth; [`VADSmoother`] keeps a short rolling window of scores and
//! only flips state once the windowed mean crosses a high "enter" bar (going
//! silence → speech) or drops below a lower "exit" bar (speech → silence).
//! The gap between the two bars is the hysteresis band.

use std::collections::VecDeque;
use std::time::Duration;

/// Windowed-mean hysteresis over a stream of (timestamp, score) samples.
pub struct VADSmoother {
    window: Duration,
    enter_threshold: f32,
    exit_threshold: f32,
    samples: VecDeque<(Duration, f32)>,
    speaking: bool,
}

impl VADSmoother {
    /// `window`: how far back to average scores over.
    /// `enter_threshold`: windowed mean required to transition silence→speech.
    /// `exit_threshold`: windowed mean below which speech→silence (must be
    /// ≤ `enter_threshold`; the gap is the hysteresis band).
    pub fn new(window: Duration, enter_threshold: f32, exit_threshold: f32) -> Self {
        Self {
            window,
            enter_threshold,
            exit_threshold,
            samples: VecDeque::new(),
            speaking: false,
        }
    }

    /// Feed one new score observed at time `now` (monotonic clock, any
    /// origin as long as it is consistent across calls). Returns the
    /// (possibly unchanged) speaking state after applying hysteresis.
    pub fn update(&mut self, score: f32, now: Duration) -> bool {
        self.samples.push_back((now, score));
        while let Some(&(t, _)) = self.samples.front() {
            if now.saturating_sub(t) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }

        let mean = self.windowed_mean();
        if !self.speaking && mean > self.enter_threshold {
            self.speaking = true;
        } else if self.speaking && mean < self.exit_threshold {
            self.speaking = false;
        }
        self.speaking
    }

    fn windowed_mean(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.samples.iter().map(|&(_, s)| s).sum();
        sum / self.samples.len() as f32
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.speaking = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn stays_silent_below_enter_threshold() {
        let mut s = VADSmoother::new(ms(400), 0.6, 0.3);
        for t in (0..400).step_by(40) {
            assert!(!s.update(0.4, ms(t)));
        }
    }

    #[test]
    fn transitions_to_speech_once_mean_exceeds_enter() {
        let mut s = VADSmoother::new(ms(400), 0.6, 0.3);
        let mut last = false;
        for t in (0..800).step_by(40) {
            last = s.update(0.9, ms(t));
        }
        assert!(last, "sustained high score should cross enter threshold");
    }

    #[test]
    fn single_spike_does_not_flip_state() {
        let mut s = VADSmoother::new(ms(400), 0.6, 0.3);
        for t in (0..400).step_by(40) {
            s.update(0.1, ms(t));
        }
        // one spike is diluted by the rest of the window's low scores
        let speaking = s.update(1.0, ms(440));
        assert!(!speaking);
    }

    #[test]
    fn hysteresis_band_keeps_speaking_between_thresholds() {
        let mut s = VADSmoother::new(ms(400), 0.6, 0.3);
        for t in (0..800).step_by(40) {
            s.update(0.9, ms(t));
        }
        assert!(s.is_speaking());
        // mean drops to 0.45, between exit(0.3) and enter(0.6) -> must stay speaking
        let speaking = s.update(0.45, ms(840));
        assert!(speaking, "mean within hysteresis band must not exit speech");
    }

    #[test]
    fn drops_to_silence_once_mean_below_exit() {
        let mut s = VADSmoother::new(ms(400), 0.6, 0.3);
        for t in (0..800).step_by(40) {
            s.update(0.9, ms(t));
        }
        assert!(s.is_speaking());
        let mut speaking = true;
        for t in (840..1400).step_by(40) {
            speaking = s.update(0.05, ms(t));
        }
        assert!(!speaking);
    }

    #[test]
    fn reset_clears_window_and_state() {
        let mut s = VADSmoother::new(ms(400), 0.6, 0.3);
        for t in (0..800).step_by(40) {
            s.update(0.9, ms(t));
        }
        assert!(s.is_speaking());
        s.reset();
        assert!(!s.is_speaking());
        assert!(!s.update(0.4, ms(0)));
    }
}
