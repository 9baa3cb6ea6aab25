//! Pipeline tuning knobs.
//!
//! Loading config files and parsing CLI flags are explicitly out of scope
//! for this crate (external collaborators own that). What lives here is the
//! typed, `Default`-backed settings struct plus the narrow env-var override
//! mechanism the pipeline itself reads — mirroring how the engine crate this
//! was grown from reads a handful of `DICTUM_*` knobs directly rather than
//! carrying a config-file loader.

use std::time::Duration;

/// Tunables for one end-to-end pipeline instance.
///
/// Every field has a production default from the spec; `debug_mode` shortens
/// the inactivity-reset windows for fast local iteration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub sample_rate: u32,
    pub block_size: usize,
    pub buffer_duration: Duration,

    pub vad_window_ms: u64,
    pub vad_enter_threshold: f32,
    pub vad_exit_threshold: f32,

    pub silence_min_continuous_ms: u64,
    pub silence_window_ms: u64,

    pub max_latency: Duration,
    pub watchdog_timeout: Duration,
    pub backpressure_threshold: usize,

    pub repeat_score_delta: f32,
    pub repeat_window: usize,

    pub confirmations_required: u32,
    pub memory_capacity: usize,
    pub suggestion_ring_capacity: usize,
    pub cache_capacity: usize,

    pub debug_mode: bool,
    pub dead_mic_silence: Duration,
    pub dead_mic_rms_floor: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            block_size: 512,
            buffer_duration: Duration::from_millis(1_200),

            vad_window_ms: 400,
            vad_enter_threshold: 0.6,
            vad_exit_threshold: 0.3,

            silence_min_continuous_ms: 600,
            silence_window_ms: 800,

            max_latency: Duration::from_millis(1_500),
            watchdog_timeout: Duration::from_secs(2),
            backpressure_threshold: 3,

            repeat_score_delta: 0.1,
            repeat_window: 5,

            confirmations_required: 2,
            memory_capacity: 5,
            suggestion_ring_capacity: 5,
            cache_capacity: 200,

            debug_mode: false,
            dead_mic_silence: Duration::from_secs(4),
            dead_mic_rms_floor: 1e-4,
        }
    }
}

impl PipelineConfig {
    /// The inactivity window after which [`crate::dialogue::memory::RollingMemory`]
    /// and the state machine reset: 90s in production, 10s with `debug_mode`.
    pub fn inactivity_reset(&self) -> Duration {
        if self.debug_mode {
            Duration::from_secs(10)
        } else {
            Duration::from_secs(90)
        }
    }

    /// Frame capacity of the audio ring buffer: enough frames to cover
    /// `buffer_duration` at `block_size`/`sample_rate`, plus one.
    pub fn ring_capacity_frames(&self) -> usize {
        let frame_secs = self.block_size as f64 / self.sample_rate as f64;
        (self.buffer_duration.as_secs_f64() / frame_secs).ceil() as usize + 1
    }

    /// Overlay values supplied through environment variables onto defaults.
    /// Unset or unparsable variables are left at their current value.
    pub fn with_env_overrides(mut self) -> Self {
        macro_rules! env_parse {
            ($field:expr, $name:expr) => {
                if let Ok(v) = std::env::var($name) {
                    if let Ok(parsed) = v.parse() {
                        $field = parsed;
                    }
                }
            };
        }
        env_parse!(self.sample_rate, "CADENCE_SAMPLE_RATE");
        env_parse!(self.block_size, "CADENCE_BLOCK_SIZE");
        env_parse!(self.vad_enter_threshold, "CADENCE_VAD_ENTER");
        env_parse!(self.vad_exit_threshold, "CADENCE_VAD_EXIT");
        env_parse!(self.silence_min_continuous_ms, "CADENCE_SILENCE_MIN_MS");
        env_parse!(self.silence_window_ms, "CADENCE_SILENCE_WINDOW_MS");
        env_parse!(self.backpressure_threshold, "CADENCE_BACKPRESSURE_THRESHOLD");
        env_parse!(self.debug_mode, "CADENCE_DEBUG_MODE");

        if let Ok(ms) = std::env::var("CADENCE_MAX_LATENCY_MS") {
            if let Ok(parsed) = ms.parse::<u64>() {
                self.max_latency = Duration::from_millis(parsed);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ring_capacity_matches_1_2s_at_16k_512() {
        let cfg = PipelineConfig::default();
        // 1.2s / (512/16000) = 37.5 -> ceil 38, +1 = 39
        assert_eq!(cfg.ring_capacity_frames(), 39);
    }

    #[test]
    fn debug_mode_shortens_inactivity_reset() {
        let mut cfg = PipelineConfig::default();
        cfg.debug_mode = true;
        assert_eq!(cfg.inactivity_reset(), Duration::from_secs(10));
    }

    #[test]
    fn prod_mode_keeps_90s_inactivity_reset() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.inactivity_reset(), Duration::from_secs(90));
    }
}
