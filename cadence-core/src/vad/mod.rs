//! Voice Activity Detection (VAD) abstraction.
//!
//! Two layers: a [`VoiceActivityScorer`] turns raw audio into a continuous
//! per-frame speech probability, and [`smoother::VADSmoother`] turns that
//! noisy score stream into a debounced speaking/not-speaking signal the
//! Sentinel state machine can act on. [`energy::EnergyVad`] is kept as a
//! self-contained binary detector (its own hangover-based hysteresis) for
//! callers that don't need the two-layer split.

pub mod energy;
pub mod jitter;
pub mod smoother;

#[cfg(feature = "onnx")]
pub mod silero;

#[cfg(feature = "onnx")]
pub use silero::SileroVad;

pub use jitter::SilenceJitter;
pub use smoother::VADSmoother;

use crate::buffering::chunk::AudioChunk;
use crate::model::AudioFrame;

/// Whether a given audio frame contains speech or silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VadDecision {
    /// The frame contains speech energy above threshold.
    Speech,
    /// The frame is silent (or below threshold, including hangover period).
    Silence,
}

impl VadDecision {
    pub fn is_speech(self) -> bool {
        self == VadDecision::Speech
    }
}

/// Trait for self-contained binary VAD implementations.
///
/// Implementors may be stateful (hangover counters, RNN hidden states, etc.).
pub trait VoiceActivityDetector: Send + 'static {
    /// Analyse a chunk and return a speech/silence decision.
    ///
    /// The chunk's `sample_rate` should match whatever rate this detector
    /// was configured for. Resampling is the caller's responsibility.
    fn classify(&mut self, chunk: &AudioChunk) -> VadDecision;

    /// Reset any internal state (e.g. hangover counters, hidden states).
    fn reset(&mut self);
}

/// Trait for scoring models that emit a continuous speech probability
/// per frame rather than a binary decision — the input [`VADSmoother`]
/// expects. `EnergyVad`'s RMS computation and `SileroVad`'s model output
/// both fit this shape.
pub trait VoiceActivityScorer: Send + 'static {
    /// Score one frame in `[0.0, 1.0]` (not required to be a true
    /// probability — only monotonic in "speech-likeness").
    fn score(&mut self, frame: &AudioFrame) -> f32;

    fn reset(&mut self);
}

/// RMS-based scorer: a thin continuous-output sibling of [`energy::EnergyVad`].
/// Maps RMS amplitude linearly onto `[0, 1]` via a configurable gain, so a
/// [`VADSmoother`] can apply its own hysteresis on top instead of relying on
/// `EnergyVad`'s built-in hangover counter.
pub struct EnergyScorer {
    gain: f32,
}

impl EnergyScorer {
    /// `gain`: RMS amplitude that should map to a score of 1.0. Typical
    /// speech peaks around 0.05-0.2 RMS for a normalised mic signal.
    pub fn new(gain: f32) -> Self {
        Self { gain }
    }
}

impl Default for EnergyScorer {
    fn default() -> Self {
        Self::new(0.08)
    }
}

impl VoiceActivityScorer for EnergyScorer {
    fn score(&mut self, frame: &AudioFrame) -> f32 {
        if frame.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = frame.samples.iter().map(|s| s * s).sum();
        let rms = (sum_sq / frame.samples.len() as f32).sqrt();
        (rms / self.gain).clamp(0.0, 1.0)
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_scorer_silence_is_zero() {
        let mut scorer = EnergyScorer::default();
        let frame = AudioFrame::new(vec![0.0; 256], 16_000);
        assert_eq!(scorer.score(&frame), 0.0);
    }

    #[test]
    fn energy_scorer_loud_frame_saturates() {
        let mut scorer = EnergyScorer::new(0.08);
        let frame = AudioFrame::new(vec![1.0; 256], 16_000);
        assert_eq!(scorer.score(&frame), 1.0);
    }
}
