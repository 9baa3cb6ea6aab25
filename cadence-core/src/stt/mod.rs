//! Speech-to-text: the external collaborator contract plus a deterministic
//! stub used by tests and the dry-run harness.

use crate::error::Result;

/// One transcription outcome.
#[derive(Debug, Clone)]
pub struct SttOutput {
    pub text: String,
    pub latency_ms: f64,
}

/// Contract for a speech-to-text backend. A concrete model (Whisper via
/// `ort`, a cloud API, etc.) lives outside this crate's required surface;
/// only the trait and a couple of deterministic test doubles live here.
pub trait SttEngine: Send + Sync + 'static {
    fn transcribe(&self, samples: &[f32]) -> Result<SttOutput>;
}

/// Echoes a fixed string regardless of input — useful for wiring tests and
/// the dry-run harness without a real model.
pub struct StubSttEngine {
    pub text: String,
    pub latency_ms: f64,
}

impl StubSttEngine {
    pub fn new(text: impl Into<String>, latency_ms: f64) -> Self {
        Self {
            text: text.into(),
            latency_ms,
        }
    }
}

impl SttEngine for StubSttEngine {
    fn transcribe(&self, _samples: &[f32]) -> Result<SttOutput> {
        Ok(SttOutput {
            text: self.text.clone(),
            latency_ms: self.latency_ms,
        })
    }
}
