use std::time::Duration;

use cadence_core::error::Result;
use cadence_core::intent::{DotProductClassifier, StubEmbedder, TextEmbedder};
use cadence_core::model::{Decision, SilenceTriggerEvent};
use cadence_core::stt::{SttEngine, SttOutput};
use cadence_core::worker::services::InferenceService;
use cadence_core::worker::Worker;

struct DelayEngine {
    delay: Duration,
    text: &'static str,
}

impl SttEngine for DelayEngine {
    fn transcribe(&self, _samples: &[f32]) -> Result<SttOutput> {
        std::thread::sleep(self.delay);
        Ok(SttOutput {
            text: self.text.into(),
            latency_ms: self.delay.as_secs_f64() * 1000.0,
        })
    }
}

fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs_f64()
}

#[test]
fn a_fast_transcription_stays_under_the_latency_budget() {
    let engine = DelayEngine {
        delay: Duration::from_millis(20),
        text: "what is your timeline",
    };
    let inference = InferenceService::new(engine, 2, Duration::from_millis(1));

    let embedder = StubEmbedder { dims: 16 };
    let prompts = ["what is your budget", "what is your timeline"];
    let embeddings: Vec<Vec<f32>> = prompts.iter().map(|p| embedder.embed(p)).collect();
    let classifier = DotProductClassifier::new(embedder, embeddings);

    let worker = Worker::new(
        inference,
        classifier,
        Duration::from_millis(500),
        Duration::from_secs(2),
        3,
        5,
        0.1,
        None,
        None,
    );

    let event = SilenceTriggerEvent::new(now_secs(), vec![0.0; 512]);
    let start = std::time::Instant::now();
    let result = worker.process(&event);
    let elapsed = start.elapsed();

    assert_eq!(result.decision, Decision::Success);
    assert_eq!(result.prompt_id, "1");
    assert!(
        elapsed < Duration::from_millis(500),
        "worker pass took too long: {:?} (target < 500ms)",
        elapsed
    );
}

#[test]
fn a_transcription_slower_than_the_budget_is_suppressed_as_late() {
    let engine = DelayEngine {
        delay: Duration::from_millis(5),
        text: "anything",
    };
    let inference = InferenceService::new(engine, 2, Duration::from_millis(1));
    let embedder = StubEmbedder { dims: 8 };
    let classifier = DotProductClassifier::new(embedder, vec![]);

    let worker = Worker::new(
        inference,
        classifier,
        Duration::from_millis(1500),
        Duration::from_secs(2),
        3,
        5,
        0.1,
        None,
        None,
    );

    // An event stamped well in the past simulates one that sat behind a
    // backlog long enough to blow the latency budget by the time the
    // worker finally reaches it.
    let event = SilenceTriggerEvent::new(now_secs() - 3.0, vec![0.0; 512]);
    let result = worker.process(&event);
    assert_eq!(result.decision, Decision::SuppressedLate);
}
