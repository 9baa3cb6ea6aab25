use thiserror::Error;

/// All errors produced by cadence-core.
///
/// Every variant here is recoverable at the stage boundary where it
/// originates — the pipeline logs and routes around it via telemetry
/// rather than aborting. Only composition-time wiring failures (a missing
/// model file, a device that refuses to open) are fatal to the caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("audio device error: {0}")]
    AudioDevice(String),

    #[error("audio stream error: {0}")]
    AudioStream(String),

    #[error("no default input device found")]
    NoDefaultInputDevice,

    #[error("ring buffer is full — pipeline cannot keep up")]
    RingBufferFull,

    #[error("schema error: {0}")]
    Schema(String),

    #[error("inference error: {0}")]
    Inference(String),

    #[error("engine is already running")]
    AlreadyRunning,

    #[error("engine is not running")]
    NotRunning,

    #[error("device error: {0}")]
    Device(String),

    #[error("back-pressure threshold exceeded: {pending} pending events")]
    Backpressure { pending: usize },

    #[error("latency budget exceeded: {elapsed_ms}ms > {budget_ms}ms")]
    LatencyExceeded { elapsed_ms: u64, budget_ms: u64 },

    #[error("suppressed as a repeat of prompt {prompt_id} (Δscore={delta:.3})")]
    RepeatSuppression { prompt_id: String, delta: f32 },

    #[error("watchdog timeout: event {event_id} in flight for {elapsed_ms}ms")]
    WatchdogTimeout { event_id: String, elapsed_ms: u64 },

    #[error("ONNX session error: {0}")]
    OnnxSession(String),

    #[error("model file not found: {path}")]
    ModelNotFound { path: std::path::PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
