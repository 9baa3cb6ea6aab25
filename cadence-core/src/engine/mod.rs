//! `CadenceEngine` — top-level lifecycle controller wiring every stage
//! together: `AudioSource` frames feed the Sentinel, the Sentinel's
//! silence-trigger events feed the Worker over the `EventBus`, and the
//! Worker's successful results feed the `DialogueBrain`, which publishes
//! suggestions (and resets) back onto the same bus for a HUD sink.
//!
//! ## Lifecycle
//!
//! ```text
//! CadenceEngine::new()
//!     └─► warm_up()    → one dummy STT + intent pass, status Idle -> WarmingUp -> Idle
//!         └─► start()  → audio source opened, three stage threads spawned, status Listening
//!             └─► stop() → running=false, threads joined, status Stopped
//! ```
//!
//! `start()`/`stop()` are idempotent against the wrong state: calling either
//! out of turn returns [`crate::error::PipelineError::AlreadyRunning`] or
//! `NotRunning` rather than panicking.
//!
//! ## Threading
//!
//! The Sentinel and Worker stage loops are both CPU-bound (VAD scoring, STT,
//! intent classification) and must not run on an async executor thread, so
//! each gets its own dedicated OS thread rather than a `tokio` task — the
//! same reasoning the audio capture thread already follows in
//! [`crate::audio::source::CpalAudioSource`]. `AudioSource::start` bridges
//! the capture callback into the Sentinel's existing blocking-channel
//! interface ([`crate::sentinel::Sentinel::run_blocking`]) via an unbounded
//! `crossbeam_channel`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{unbounded, RecvTimeoutError};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::audio::AudioSource;
use crate::config::PipelineConfig;
use crate::dialogue::suggestion::SuggestionRules;
use crate::dialogue::DialogueBrain;
use crate::error::{PipelineError, Result};
use crate::eventbus::{Event, EventBus, Topic};
use crate::intent::IntentClassifier;
use crate::model::{Decision, EngineStatus, SilenceTriggerEvent};
use crate::sentinel::Sentinel;
use crate::stt::SttEngine;
use crate::telemetry::TelemetryWriter;
use crate::vad::VoiceActivityScorer;
use crate::worker::services::InferenceService;
use crate::worker::Worker;

const STAGE_RECV_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(50);

/// Owns every stage plus the threads driving them. Constructed once per
/// capture session; `start()`/`stop()` may be cycled any number of times.
pub struct CadenceEngine<A, V, S, I>
where
    A: AudioSource + 'static,
    V: VoiceActivityScorer + 'static,
    S: SttEngine,
    I: IntentClassifier,
{
    config: PipelineConfig,
    audio_source: Mutex<A>,
    sentinel: Arc<Sentinel<V>>,
    worker: Arc<Worker<S, I>>,
    brain: Arc<DialogueBrain>,
    bus: Arc<EventBus>,
    running: Arc<AtomicBool>,
    status: Mutex<EngineStatus>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl<A, V, S, I> CadenceEngine<A, V, S, I>
where
    A: AudioSource + 'static,
    V: VoiceActivityScorer + 'static,
    S: SttEngine,
    I: IntentClassifier,
{
    pub fn new(
        config: PipelineConfig,
        audio_source: A,
        scorer: V,
        stt_engine: S,
        classifier: I,
        suggestion_rules: SuggestionRules,
        telemetry: Option<Arc<TelemetryWriter>>,
    ) -> Self {
        let bus = EventBus::with_defaults();
        let sentinel = Arc::new(Sentinel::new(&config, scorer));
        let inference = InferenceService::with_defaults(stt_engine);
        let worker = Arc::new(Worker::new(
            inference,
            classifier,
            config.max_latency,
            config.watchdog_timeout,
            config.backpressure_threshold,
            config.repeat_window,
            config.repeat_score_delta,
            Some(bus.clone()),
            telemetry,
        ));
        let brain = Arc::new(DialogueBrain::new(
            config.confirmations_required,
            config.inactivity_reset(),
            config.memory_capacity,
            config.suggestion_ring_capacity,
            config.cache_capacity,
            suggestion_rules,
            Some(bus.clone()),
        ));

        Self {
            config,
            audio_source: Mutex::new(audio_source),
            sentinel,
            worker,
            brain,
            bus,
            running: Arc::new(AtomicBool::new(false)),
            status: Mutex::new(EngineStatus::Idle),
            threads: Mutex::new(Vec::new()),
        }
    }

    pub fn status(&self) -> EngineStatus {
        *self.status.lock()
    }

    pub fn bus(&self) -> Arc<EventBus> {
        self.bus.clone()
    }

    fn set_status(&self, status: EngineStatus) {
        *self.status.lock() = status;
    }

    /// Run a dummy transcribe + classify pass before accepting live audio,
    /// so the first real silence trigger doesn't pay a cold-start inference
    /// cost. Safe to skip; `start()` works without it.
    pub fn warm_up(&self) {
        self.set_status(EngineStatus::WarmingUp);
        info!("warming up speech + intent models");
        self.worker.warm_up();
        self.set_status(EngineStatus::Idle);
        info!("models warm");
    }

    /// Open the audio source and spawn the Sentinel, Worker, and
    /// DialogueBrain stage threads.
    ///
    /// # Errors
    /// Returns [`PipelineError::AlreadyRunning`] if already started, or
    /// whatever [`AudioSource::start`] returns on a device-open failure.
    pub fn start(&self) -> Result<()> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PipelineError::AlreadyRunning);
        }

        let mut threads = Vec::with_capacity(3);

        let (frame_tx, frame_rx) = unbounded();
        {
            let sentinel = self.sentinel.clone();
            let bus = self.bus.clone();
            let running = self.running.clone();
            threads.push(
                std::thread::Builder::new()
                    .name("cadence-sentinel".into())
                    .spawn(move || sentinel.run_blocking(frame_rx, bus, running))
                    .map_err(|e| PipelineError::AudioStream(e.to_string()))?,
            );
        }

        threads.push(self.spawn_worker_stage());
        threads.push(self.spawn_brain_stage());

        let block_size = self.config.block_size;
        let sample_rate = self.config.sample_rate;
        let callback_running = self.running.clone();
        let start_result = self.audio_source.lock().start(
            block_size,
            sample_rate,
            Box::new(move |frame| {
                if callback_running.load(Ordering::Acquire) {
                    let _ = frame_tx.send(frame);
                }
            }),
        );

        if let Err(e) = start_result {
            self.running.store(false, Ordering::SeqCst);
            self.set_status(EngineStatus::Error);
            return Err(e);
        }

        *self.threads.lock() = threads;
        self.set_status(EngineStatus::Listening);
        info!("engine started — listening");
        Ok(())
    }

    /// Stop audio capture and every stage thread.
    ///
    /// # Errors
    /// Returns [`PipelineError::NotRunning`] if not currently started.
    pub fn stop(&self) -> Result<()> {
        if self
            .running
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PipelineError::NotRunning);
        }

        self.audio_source.lock().stop();
        for handle in self.threads.lock().drain(..) {
            let _ = handle.join();
        }
        self.set_status(EngineStatus::Stopped);
        info!("engine stopped");
        Ok(())
    }

    /// Drains `silence_trigger` events published by the Sentinel, enforcing
    /// back-pressure before handing each remaining event to the Worker —
    /// [`Worker::process`] publishes its own `worker_result` event.
    fn spawn_worker_stage(&self) -> JoinHandle<()> {
        let (tx, rx) = unbounded::<SilenceTriggerEvent>();
        self.bus.subscribe(
            Topic::SilenceTrigger,
            Arc::new(move |event| {
                if let Event::SilenceTrigger(trigger) = event {
                    let _ = tx.send(trigger);
                }
            }),
        );

        let worker = self.worker.clone();
        let running = self.running.clone();
        std::thread::Builder::new()
            .name("cadence-worker".into())
            .spawn(move || {
                let mut pending: VecDeque<SilenceTriggerEvent> = VecDeque::new();
                while running.load(Ordering::Acquire) {
                    match rx.recv_timeout(STAGE_RECV_TIMEOUT) {
                        Ok(event) => {
                            pending.push_back(event);
                            while let Ok(event) = rx.try_recv() {
                                pending.push_back(event);
                            }
                        }
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }

                    worker.enforce_backpressure(&mut pending);
                    while let Some(event) = pending.pop_front() {
                        worker.process(&event);
                    }
                }
            })
            .expect("failed to spawn cadence-worker thread")
    }

    /// Drains `worker_result` events and feeds every `SUCCESS` transcript
    /// into the DialogueBrain — [`DialogueBrain::process`] publishes its own
    /// `suggestion`/`reset` events.
    fn spawn_brain_stage(&self) -> JoinHandle<()> {
        let (tx, rx) = unbounded::<crate::model::WorkerResult>();
        self.bus.subscribe(
            Topic::WorkerResult,
            Arc::new(move |event| {
                if let Event::WorkerResult(result) = event {
                    let _ = tx.send(result);
                }
            }),
        );

        let brain = self.brain.clone();
        let running = self.running.clone();
        std::thread::Builder::new()
            .name("cadence-brain".into())
            .spawn(move || {
                while running.load(Ordering::Acquire) {
                    match rx.recv_timeout(STAGE_RECV_TIMEOUT) {
                        Ok(result) if result.decision == Decision::Success => {
                            brain.process(&result.text, "", Instant::now());
                        }
                        Ok(_) => continue,
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .expect("failed to spawn cadence-brain thread")
    }
}

impl<A, V, S, I> Drop for CadenceEngine<A, V, S, I>
where
    A: AudioSource + 'static,
    V: VoiceActivityScorer + 'static,
    S: SttEngine,
    I: IntentClassifier,
{
    fn drop(&mut self) {
        if self.running.load(Ordering::Acquire) {
            warn!("CadenceEngine dropped while still running; stopping");
            let _ = self.stop();
        }
    }
}
