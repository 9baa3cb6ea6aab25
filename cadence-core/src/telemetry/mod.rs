//! Structured telemetry: schema validation at stage boundaries, the
//! watchdog, drift detection, error-state tracking, and the JSONL sinks.

pub mod drift;
pub mod error_state;
pub mod health;
pub mod prompt_quality;
pub mod replay;
pub mod schema;
pub mod watchdog;
pub mod writer;

pub use drift::DriftDetector;
pub use error_state::ErrorState;
pub use health::{HealthReport, HealthStats};
pub use prompt_quality::PromptQualityMonitor;
pub use replay::ReplayDump;
pub use watchdog::Watchdog;
pub use writer::TelemetryWriter;
