//! Consumes silence-trigger events, runs STT + intent classification, and
//! applies the latency governor plus repeat/back-pressure suppression.

pub mod backpressure;
pub mod governor;
pub mod latency;
pub mod repeat_filter;
pub mod services;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::eventbus::{Event, EventBus, Topic};
use crate::intent::IntentClassifier;
use crate::model::{Decision, LatencyRecord, SilenceTriggerEvent, WorkerResult};
use crate::stt::SttEngine;
use crate::telemetry::{PromptQualityMonitor, TelemetryWriter, Watchdog};

use backpressure::BackpressureController;
use governor::GovernorService;
use repeat_filter::AntiRepeatCache;
use services::InferenceService;

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

pub struct Worker<S: SttEngine, I: IntentClassifier> {
    inference: InferenceService<S>,
    classifier: I,
    governor: GovernorService,
    repeat_filter: Mutex<AntiRepeatCache>,
    latency_history: Mutex<latency::LatencyHistory>,
    backpressure: BackpressureController,
    watchdog: Mutex<Watchdog>,
    prompt_quality: PromptQualityMonitor,
    bus: Option<Arc<EventBus>>,
    telemetry: Option<Arc<TelemetryWriter>>,
}

impl<S: SttEngine, I: IntentClassifier> Worker<S, I> {
    pub fn new(
        inference: InferenceService<S>,
        classifier: I,
        max_latency: Duration,
        watchdog_timeout: Duration,
        backpressure_threshold: usize,
        repeat_window: usize,
        repeat_score_delta: f32,
        bus: Option<Arc<EventBus>>,
        telemetry: Option<Arc<TelemetryWriter>>,
    ) -> Self {
        Self {
            inference,
            classifier,
            governor: GovernorService::new(max_latency),
            repeat_filter: Mutex::new(AntiRepeatCache::new(repeat_window, repeat_score_delta)),
            latency_history: Mutex::new(latency::LatencyHistory::new()),
            backpressure: BackpressureController::new(backpressure_threshold),
            watchdog: Mutex::new(Watchdog::new(watchdog_timeout)),
            prompt_quality: PromptQualityMonitor::default(),
            bus,
            telemetry,
        }
    }

    /// Drop the oldest pending triggers past the back-pressure threshold,
    /// emitting (and publishing) a `SUPPRESSED_BACKPRESSURE` result for
    /// each before the remaining queue is processed normally.
    pub fn enforce_backpressure(&self, pending: &mut VecDeque<SilenceTriggerEvent>) -> Vec<WorkerResult> {
        let dropped = self.backpressure.enforce(pending);
        dropped
            .into_iter()
            .map(|event| {
                let now = unix_now();
                let result = WorkerResult {
                    event_id: event.event_id,
                    event_timestamp: event.sentinel_timestamp,
                    sentinel_timestamp: event.sentinel_timestamp,
                    worker_start_ts: now,
                    text: String::new(),
                    prompt_id: String::new(),
                    score: 0.0,
                    whisper_latency: 0.0,
                    intent_latency: 0.0,
                    transport_latency_ms: 0.0,
                    total_latency_ms: (now - event.sentinel_timestamp) * 1000.0,
                    decision: Decision::SuppressedBackpressure,
                };
                self.publish(&result);
                result
            })
            .collect()
    }

    /// Process one trigger end to end, returning the result that was (if a
    /// bus/telemetry sink is configured) also published.
    pub fn process(&self, event: &SilenceTriggerEvent) -> WorkerResult {
        let worker_start = Instant::now();
        let worker_start_ts = unix_now();
        self.watchdog.lock().start(event.event_id, worker_start);

        let stt = self.inference.transcribe(&event.audio_snapshot);
        let safe_mode = self.inference.safe_mode();

        let (text, prompt_id, score, whisper_latency, intent_latency) = match stt {
            Ok(out) => {
                let whisper_latency = out.latency_ms;
                match self.classifier.classify(&out.text) {
                    Ok(intent) => (out.text, intent.prompt_id, intent.score, whisper_latency, intent.latency_ms),
                    Err(_) => (out.text, String::new(), 0.0, whisper_latency, 0.0),
                }
            }
            Err(_) => (String::new(), String::new(), 0.0, 0.0, 0.0),
        };

        let event_age = Duration::from_secs_f64((worker_start_ts - event.sentinel_timestamp).max(0.0));
        let is_repeat = !prompt_id.is_empty() && self.repeat_filter.lock().is_repeat(&prompt_id, score);
        let decision = self.governor.decide(event_age, safe_mode, is_repeat);

        if decision == Decision::Success {
            self.prompt_quality.evaluate(&prompt_id, score);
            if !prompt_id.is_empty() {
                self.repeat_filter.lock().record(&prompt_id, score);
            }
        }

        let total_latency_ms = worker_start.elapsed().as_secs_f64() * 1000.0 + whisper_latency + intent_latency;
        let record = LatencyRecord {
            whisper_ms: whisper_latency,
            intent_ms: intent_latency,
            total_ms: total_latency_ms,
            decision,
        };
        self.latency_history.lock().record(record);
        self.watchdog.lock().finish(event.event_id);

        let result = WorkerResult {
            event_id: event.event_id,
            event_timestamp: event.sentinel_timestamp,
            sentinel_timestamp: event.sentinel_timestamp,
            worker_start_ts,
            text,
            prompt_id,
            score,
            whisper_latency,
            intent_latency,
            transport_latency_ms: (worker_start_ts - event.sentinel_timestamp).max(0.0) * 1000.0,
            total_latency_ms,
            decision,
        };
        self.publish(&result);
        result
    }

    fn publish(&self, result: &WorkerResult) {
        if let Some(bus) = &self.bus {
            bus.publish(Topic::WorkerResult, Event::WorkerResult(result.clone()));
        }
        if let Some(writer) = &self.telemetry {
            let _ = writer.write_line(result);
        }
    }

    /// Run one dummy transcribe + classify pass and discard the result, so
    /// the first real trigger after startup doesn't pay a cold-start
    /// inference cost. Does not touch the repeat filter, latency history,
    /// watchdog, or bus/telemetry sinks.
    pub fn warm_up(&self) {
        if let Ok(out) = self.inference.transcribe(&[0.0; 16]) {
            let _ = self.classifier.classify(&out.text);
        }
    }

    pub fn overdue_events(&self, now: Instant) -> Vec<uuid::Uuid> {
        self.watchdog.lock().overdue(now)
    }

    pub fn latency_snapshot(&self) -> (Option<f64>, Option<f64>, Option<f64>, f64) {
        let history = self.latency_history.lock();
        (history.p50(), history.p95(), history.p99(), history.suppression_rate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{DotProductClassifier, StubEmbedder};
    use crate::stt::StubSttEngine;

    fn worker(latency_ms: f64) -> Worker<StubSttEngine, DotProductClassifier<StubEmbedder>> {
        let engine = StubSttEngine::new("what is your budget", latency_ms);
        let inference = InferenceService::new(engine, 2, Duration::from_millis(1));
        let embedder = StubEmbedder { dims: 8 };
        let embeddings = vec![embedder.embed("what is your budget")];
        let classifier = DotProductClassifier::new(embedder, embeddings);
        Worker::new(
            inference,
            classifier,
            Duration::from_millis(1500),
            Duration::from_secs(2),
            3,
            5,
            0.1,
            None,
            None,
        )
    }

    #[test]
    fn happy_path_succeeds() {
        let w = worker(50.0);
        let event = SilenceTriggerEvent::new(unix_now(), vec![0.0; 16]);
        let result = w.process(&event);
        assert_eq!(result.decision, Decision::Success);
        assert_eq!(result.prompt_id, "0");
    }

    #[test]
    fn stale_event_is_suppressed_late() {
        let w = worker(50.0);
        let event = SilenceTriggerEvent::new(unix_now() - 2.0, vec![0.0; 16]);
        let result = w.process(&event);
        assert_eq!(result.decision, Decision::SuppressedLate);
    }

    #[test]
    fn repeated_result_is_suppressed() {
        let w = worker(50.0);
        let event1 = SilenceTriggerEvent::new(unix_now(), vec![0.0; 16]);
        let r1 = w.process(&event1);
        assert_eq!(r1.decision, Decision::Success);
        let event2 = SilenceTriggerEvent::new(unix_now(), vec![0.0; 16]);
        let r2 = w.process(&event2);
        assert_eq!(r2.decision, Decision::SuppressedRepeat);
    }

    #[test]
    fn warm_up_does_not_affect_repeat_filter_or_latency_history() {
        let w = worker(50.0);
        w.warm_up();
        let (p50, _, _, _) = w.latency_snapshot();
        assert_eq!(p50, None, "warm_up must not record a latency sample");
        let event = SilenceTriggerEvent::new(unix_now(), vec![0.0; 16]);
        let result = w.process(&event);
        assert_eq!(result.decision, Decision::Success, "warm_up must not have poisoned the repeat filter");
    }

    #[test]
    fn backpressure_drops_oldest_pending() {
        let w = worker(50.0);
        let mut pending = VecDeque::new();
        for _ in 0..5 {
            pending.push_back(SilenceTriggerEvent::new(unix_now(), vec![0.0; 16]));
        }
        let dropped = w.enforce_backpressure(&mut pending);
        assert_eq!(dropped.len(), 2);
        assert!(dropped.iter().all(|r| r.decision == Decision::SuppressedBackpressure));
        assert_eq!(pending.len(), 3);
    }
}
