//! # cadence-core
//!
//! The reusable engine behind a real-time cognitive sales-conversation
//! assistant: microphone audio in, conversational-stage suggestions out.
//!
//! ## Architecture
//!
//! ```text
//! AudioSource → Sentinel → EventBus(silence_trigger) → Worker
//!                                                          │
//!                                              EventBus(worker_result)
//!                                                          │
//!                                                   DialogueBrain
//!                                                          │
//!                                              EventBus(suggestion) → HUD sink
//! ```
//!
//! The audio capture callback is zero-alloc; all buffering, VAD, STT,
//! intent classification, and dialogue-state tracking happen off that
//! thread. Concrete STT/embedding models, microphone hardware, and HUD
//! rendering are external collaborators reached through this crate's
//! traits — `SttEngine`, `IntentClassifier`, `AudioSource`.
//!
//! [`engine::CadenceEngine`] owns this whole wiring diagram as a single
//! start/stop/status handle; callers who want each stage individually (as
//! `health-check` does) can still compose `Sentinel`/`Worker`/`DialogueBrain`
//! directly.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod buffering;
pub mod config;
pub mod dialogue;
pub mod engine;
pub mod error;
pub mod eventbus;
pub mod intent;
pub mod model;
pub mod sentinel;
pub mod stt;
pub mod telemetry;
pub mod vad;
pub mod worker;

pub use config::PipelineConfig;
pub use engine::CadenceEngine;
pub use error::{PipelineError, Result};
pub use eventbus::{Event, EventBus, SubscriptionId, Topic};
pub use model::EngineStatus;
pub use sentinel::{Sentinel, SentinelState};
pub use worker::Worker;

#[cfg(feature = "onnx")]
pub use vad::SileroVad;
