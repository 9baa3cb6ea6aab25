use crate::model::{SilenceTriggerEvent, SuggestionEvent, WorkerResult};

/// One payload carried through the bus, tagged by which topic it belongs on.
/// A single enum (rather than `Box<dyn Any>`) keeps dispatch closures
/// `Clone` and lets every subscriber pattern-match without downcasting.
#[derive(Debug, Clone)]
pub enum Event {
    SilenceTrigger(SilenceTriggerEvent),
    WorkerResult(WorkerResult),
    Suggestion(SuggestionEvent),
    Reset(ResetEvent),
    MicDead(MicDeadEvent),
    Telemetry(serde_json::Value),
}

/// Published when the dialogue state machine or rolling memory resets due
/// to inactivity.
#[derive(Debug, Clone)]
pub struct ResetEvent {
    pub at: f64,
    pub reason: &'static str,
}

/// Published by the Sentinel when no speech and near-zero RMS have been
/// observed for the configured dead-mic window.
#[derive(Debug, Clone)]
pub struct MicDeadEvent {
    pub at: f64,
    pub silent_for_secs: f64,
}
