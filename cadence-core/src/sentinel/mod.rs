//! Consumes a continuous frame stream, maintains the rolling audio window,
//! runs hysteresis VAD, and emits silence-trigger and dead-mic events.
//!
//! One frame at a time: push to the ring, score it, smooth the score into
//! a speaking/not-speaking decision, and feed the silence debouncer. A
//! scorer panic (a stand-in for the exception a model-backed scorer can
//! raise) is caught and treated as a non-speech frame rather than killing
//! the loop, with the failure counted toward the same consecutive-failure
//! tracking the Worker uses for STT.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossbeam_channel::Receiver;
use parking_lot::Mutex;

use crate::buffering::AudioRingBuffer;
use crate::config::PipelineConfig;
use crate::eventbus::{Event, EventBus, MicDeadEvent, Topic};
use crate::model::{AudioFrame, SilenceTriggerEvent};
use crate::telemetry::ErrorState;
use crate::vad::{SilenceJitter, VADSmoother, VoiceActivityScorer};

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Coarse lifecycle state surfaced for diagnostics/HUD purposes. Behavior
/// (when a trigger actually fires) is driven entirely by the jitter
/// debouncer; this enum just names where in that cycle the Sentinel is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelState {
    Listening,
    Speaking,
    TriggerEmitted,
}

#[derive(Default)]
pub struct SentinelDiagnostics {
    pub frames_in: AtomicUsize,
    pub triggers_emitted: AtomicUsize,
    pub mic_dead_events: AtomicUsize,
    pub scorer_errors: AtomicUsize,
}

impl SentinelDiagnostics {
    pub fn snapshot(&self) -> (usize, usize, usize, usize) {
        (
            self.frames_in.load(Ordering::Relaxed),
            self.triggers_emitted.load(Ordering::Relaxed),
            self.mic_dead_events.load(Ordering::Relaxed),
            self.scorer_errors.load(Ordering::Relaxed),
        )
    }
}

struct DeadMicTracker {
    continuous_silence: Duration,
    already_emitted: bool,
}

/// Owns the rolling audio window, VAD smoothing/debouncing, and dead-mic
/// detection for one capture session.
pub struct Sentinel<V: VoiceActivityScorer> {
    ring: Arc<AudioRingBuffer>,
    scorer: Mutex<V>,
    smoother: Mutex<VADSmoother>,
    jitter: Mutex<SilenceJitter>,
    dead_mic_silence: Duration,
    dead_mic_rms_floor: f32,
    dead_mic: Mutex<DeadMicTracker>,
    error_state: Mutex<ErrorState>,
    state: Mutex<SentinelState>,
    pub diagnostics: Arc<SentinelDiagnostics>,
}

impl<V: VoiceActivityScorer> Sentinel<V> {
    pub fn new(config: &PipelineConfig, scorer: V) -> Self {
        Self {
            ring: Arc::new(AudioRingBuffer::new(config.ring_capacity_frames())),
            scorer: Mutex::new(scorer),
            smoother: Mutex::new(VADSmoother::new(
                Duration::from_millis(config.vad_window_ms),
                config.vad_enter_threshold,
                config.vad_exit_threshold,
            )),
            jitter: Mutex::new(SilenceJitter::new(
                config.silence_min_continuous_ms,
                config.silence_window_ms,
            )),
            dead_mic_silence: config.dead_mic_silence,
            dead_mic_rms_floor: config.dead_mic_rms_floor,
            dead_mic: Mutex::new(DeadMicTracker {
                continuous_silence: Duration::ZERO,
                already_emitted: false,
            }),
            error_state: Mutex::new(ErrorState::new(2)),
            state: Mutex::new(SentinelState::Listening),
            diagnostics: Arc::new(SentinelDiagnostics::default()),
        }
    }

    pub fn ring(&self) -> Arc<AudioRingBuffer> {
        self.ring.clone()
    }

    pub fn state(&self) -> SentinelState {
        *self.state.lock()
    }

    fn rms(frame: &AudioFrame) -> f32 {
        if frame.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = frame.samples.iter().map(|s| s * s).sum();
        (sum_sq / frame.samples.len() as f32).sqrt()
    }

    fn frame_duration(frame: &AudioFrame) -> Duration {
        if frame.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(frame.len() as f64 / frame.sample_rate as f64)
    }

    /// Process one frame: push it to the rolling window, update VAD, and
    /// return whatever events (zero, one, or both) should be published.
    /// `elapsed` is the monotonic time since this Sentinel's capture
    /// session began, used by the smoother's rolling-mean window.
    pub fn process_frame(&self, frame: AudioFrame, elapsed: Duration) -> Vec<Event> {
        self.diagnostics.frames_in.fetch_add(1, Ordering::Relaxed);
        let mut events = Vec::new();
        let delta_ms = Self::frame_duration(&frame).as_millis() as u64;
        let rms = Self::rms(&frame);

        self.ring.push(frame.clone());

        let score_result = catch_unwind(AssertUnwindSafe(|| self.scorer.lock().score(&frame)));
        let score = match score_result {
            Ok(s) => {
                self.error_state.lock().record_success();
                s
            }
            Err(_) => {
                self.diagnostics.scorer_errors.fetch_add(1, Ordering::Relaxed);
                self.error_state.lock().record_failure();
                0.0
            }
        };

        let speaking = self.smoother.lock().update(score, elapsed);

        if speaking {
            *self.state.lock() = SentinelState::Speaking;
            self.jitter.lock().reset_on_speech();
            let mut dead_mic = self.dead_mic.lock();
            dead_mic.continuous_silence = Duration::ZERO;
            dead_mic.already_emitted = false;
        } else {
            let mut jitter = self.jitter.lock();
            jitter.update_silence(delta_ms);

            let mut dead_mic = self.dead_mic.lock();
            if rms < self.dead_mic_rms_floor {
                dead_mic.continuous_silence += Duration::from_millis(delta_ms);
            } else {
                dead_mic.continuous_silence = Duration::ZERO;
            }
            if !dead_mic.already_emitted && dead_mic.continuous_silence >= self.dead_mic_silence {
                dead_mic.already_emitted = true;
                self.diagnostics.mic_dead_events.fetch_add(1, Ordering::Relaxed);
                events.push(Event::MicDead(MicDeadEvent {
                    at: unix_now(),
                    silent_for_secs: dead_mic.continuous_silence.as_secs_f64(),
                }));
            }

            if jitter.is_trigger_ready() {
                if let Some(snapshot) = self.ring.read_latest(None) {
                    *self.state.lock() = SentinelState::TriggerEmitted;
                    self.diagnostics.triggers_emitted.fetch_add(1, Ordering::Relaxed);
                    events.push(Event::SilenceTrigger(SilenceTriggerEvent::new(
                        unix_now(),
                        snapshot,
                    )));
                }
                jitter.reset_on_speech();
                *self.state.lock() = SentinelState::Listening;
            } else if *self.state.lock() != SentinelState::TriggerEmitted {
                *self.state.lock() = SentinelState::Listening;
            }
        }

        events
    }

    /// Drive the Sentinel from a blocking channel of incoming frames until
    /// `running` is cleared, publishing every produced event to `bus`.
    /// Mirrors the engine's blocking-loop shape: frames are drained with a
    /// short timeout so the thread can periodically check `running`
    /// instead of blocking forever on an empty channel.
    pub fn run_blocking(
        &self,
        frames: Receiver<AudioFrame>,
        bus: Arc<EventBus>,
        running: Arc<std::sync::atomic::AtomicBool>,
    ) {
        let start = Instant::now();
        while running.load(Ordering::Acquire) {
            match frames.recv_timeout(Duration::from_millis(50)) {
                Ok(frame) => {
                    let elapsed = start.elapsed();
                    for event in self.process_frame(frame, elapsed) {
                        let topic = match &event {
                            Event::SilenceTrigger(_) => Topic::SilenceTrigger,
                            Event::MicDead(_) => Topic::MicDead,
                            _ => continue,
                        };
                        bus.publish(topic, event);
                    }
                }
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ConstantScorer(f32);

    impl VoiceActivityScorer for ConstantScorer {
        fn score(&mut self, _frame: &AudioFrame) -> f32 {
            self.0
        }
        fn reset(&mut self) {}
    }

    struct PanicScorer;

    impl VoiceActivityScorer for PanicScorer {
        fn score(&mut self, _frame: &AudioFrame) -> f32 {
            panic!("scorer exploded")
        }
        fn reset(&mut self) {}
    }

    fn frame(n: usize, sample_rate: u32) -> AudioFrame {
        AudioFrame::new(vec![0.0; n], sample_rate)
    }

    fn test_config() -> PipelineConfig {
        let mut cfg = PipelineConfig::default();
        cfg.vad_window_ms = 80;
        cfg.silence_min_continuous_ms = 120;
        cfg.silence_window_ms = 120;
        cfg.dead_mic_silence = Duration::from_millis(200);
        cfg
    }

    #[test]
    fn sustained_silence_emits_a_trigger() {
        let cfg = test_config();
        let sentinel = Sentinel::new(&cfg, ConstantScorer(0.0));
        let mut ts = Duration::ZERO;
        let mut triggered = false;
        for _ in 0..20 {
            let events = sentinel.process_frame(frame(320, 16_000), ts);
            if events.iter().any(|e| matches!(e, Event::SilenceTrigger(_))) {
                triggered = true;
                break;
            }
            ts += Duration::from_millis(20);
        }
        assert!(triggered, "sustained silence should eventually emit a trigger");
    }

    #[test]
    fn sustained_speech_never_triggers() {
        let cfg = test_config();
        let sentinel = Sentinel::new(&cfg, ConstantScorer(1.0));
        let mut ts = Duration::ZERO;
        for _ in 0..20 {
            let events = sentinel.process_frame(frame(320, 16_000), ts);
            assert!(!events.iter().any(|e| matches!(e, Event::SilenceTrigger(_))));
            ts += Duration::from_millis(20);
        }
        assert_eq!(sentinel.state(), SentinelState::Speaking);
    }

    #[test]
    fn dead_mic_fires_once_past_silence_floor() {
        let mut cfg = test_config();
        cfg.dead_mic_rms_floor = 1.0; // any near-zero frame counts as "dead"
        let sentinel = Sentinel::new(&cfg, ConstantScorer(0.0));
        let mut ts = Duration::ZERO;
        let mut dead_count = 0;
        for _ in 0..40 {
            let events = sentinel.process_frame(frame(320, 16_000), ts);
            dead_count += events.iter().filter(|e| matches!(e, Event::MicDead(_))).count();
            ts += Duration::from_millis(20);
        }
        assert_eq!(dead_count, 1, "dead-mic event should only fire once until speech resumes");
    }

    #[test]
    fn panicking_scorer_is_treated_as_non_speech_and_counted() {
        let cfg = test_config();
        let sentinel = Sentinel::new(&cfg, PanicScorer);
        sentinel.process_frame(frame(320, 16_000), Duration::ZERO);
        let (_, _, _, errors) = sentinel.diagnostics.snapshot();
        assert_eq!(errors, 1);
    }

    #[test]
    fn ring_accumulates_pushed_frames() {
        let cfg = test_config();
        let sentinel = Sentinel::new(&cfg, ConstantScorer(0.0));
        sentinel.process_frame(frame(320, 16_000), Duration::ZERO);
        assert_eq!(sentinel.ring().len(), 1);
    }
}
