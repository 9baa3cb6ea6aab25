//! Wire/event data model shared across every pipeline stage.
//!
//! These types are the payloads carried over the [`crate::eventbus::EventBus`]
//! and written to the JSONL telemetry sinks, so every field here is
//! `Serialize`/`Deserialize` with a stable `camelCase` wire form.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One block of mono 16 kHz f32 samples, immutable once produced.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioFrame {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A detected end-of-utterance, carrying a snapshot of the trailing audio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SilenceTriggerEvent {
    pub event_id: Uuid,
    pub sentinel_timestamp: f64,
    #[serde(skip)]
    pub audio_snapshot: Vec<f32>,
}

impl SilenceTriggerEvent {
    pub fn new(sentinel_timestamp: f64, audio_snapshot: Vec<f32>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            sentinel_timestamp,
            audio_snapshot,
        }
    }
}

/// Outcome of the Worker's governor for one trigger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Success,
    SuppressedLate,
    SuppressedRepeat,
    SuppressedBackpressure,
    SuppressedSafeMode,
}

impl Decision {
    pub fn is_suppressed(&self) -> bool {
        !matches!(self, Decision::Success)
    }
}

/// The full result of one Worker pipeline pass — the 14 fields the schema
/// validator checks for on the `worker_result` topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerResult {
    pub event_id: Uuid,
    pub event_timestamp: f64,
    pub sentinel_timestamp: f64,
    pub worker_start_ts: f64,
    pub text: String,
    pub prompt_id: String,
    pub score: f32,
    pub whisper_latency: f64,
    pub intent_latency: f64,
    pub transport_latency_ms: f64,
    pub total_latency_ms: f64,
    pub decision: Decision,
}

impl WorkerResult {
    /// `event_id` and `id` name the same value per the spec invariant;
    /// this accessor documents that alias explicitly rather than
    /// duplicating the field.
    pub fn id(&self) -> Uuid {
        self.event_id
    }
}

/// A conversational stage. Fixed, closed set — not user-extensible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStateKind {
    Opening,
    Discovery,
    Pain,
    Objection,
    Close,
}

impl ConversationStateKind {
    pub const ALL: [ConversationStateKind; 5] = [
        ConversationStateKind::Opening,
        ConversationStateKind::Discovery,
        ConversationStateKind::Pain,
        ConversationStateKind::Objection,
        ConversationStateKind::Close,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStateKind::Opening => "opening",
            ConversationStateKind::Discovery => "discovery",
            ConversationStateKind::Pain => "pain",
            ConversationStateKind::Objection => "objection",
            ConversationStateKind::Close => "close",
        }
    }
}

/// One latency sample retained by the Worker's rolling history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyRecord {
    pub whisper_ms: f64,
    pub intent_ms: f64,
    pub total_ms: f64,
    pub decision: Decision,
}

/// Coarse top-level pipeline lifecycle, surfaced by [`crate::engine::CadenceEngine`]
/// for a HUD or health endpoint. Distinct from [`crate::sentinel::SentinelState`],
/// which tracks the Sentinel's own speaking/listening cycle rather than
/// whether the pipeline is running at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineStatus {
    /// Constructed but `start()` not yet called.
    Idle,
    /// `warm_up()` in progress (dummy STT + intent pass).
    WarmingUp,
    /// Actively capturing audio and producing suggestions.
    Listening,
    /// Capture stopped; the engine may be started again.
    Stopped,
    /// A stage failed to start; restart required.
    Error,
}

/// A suggestion surfaced to the HUD sink after one DialogueBrain pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionEvent {
    pub event_id: Uuid,
    pub state: ConversationStateKind,
    pub suggestion: String,
    pub cache_hit: bool,
    pub brain_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_result_round_trips_camel_case() {
        let r = WorkerResult {
            event_id: Uuid::new_v4(),
            event_timestamp: 1.0,
            sentinel_timestamp: 0.9,
            worker_start_ts: 1.01,
            text: "we need this by q3".into(),
            prompt_id: "7".into(),
            score: 0.82,
            whisper_latency: 220.0,
            intent_latency: 5.0,
            transport_latency_ms: 3.0,
            total_latency_ms: 250.0,
            decision: Decision::Success,
        };
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"promptId\""));
        assert!(json.contains("\"SUCCESS\""));
        let back: WorkerResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), r.event_id);
    }

    #[test]
    fn decision_is_suppressed_only_for_non_success() {
        assert!(!Decision::Success.is_suppressed());
        assert!(Decision::SuppressedLate.is_suppressed());
        assert!(Decision::SuppressedRepeat.is_suppressed());
    }

    #[test]
    fn conversation_state_serializes_lowercase() {
        let json = serde_json::to_string(&ConversationStateKind::Objection).unwrap();
        assert_eq!(json, "\"objection\"");
    }

    #[test]
    fn engine_status_serializes_snake_case() {
        let json = serde_json::to_string(&EngineStatus::WarmingUp).unwrap();
        assert_eq!(json, "\"warming_up\"");
    }
}
