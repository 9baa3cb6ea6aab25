//! Wraps an [`SttEngine`] with the worker's retry-once-then-safe-mode
//! policy: a single transcription failure is retried once after a short
//! delay; if the retry also fails, the failure is counted toward
//! [`ErrorState`]'s consecutive-failure streak, which trips safe mode once
//! it reaches its threshold.

use std::time::Duration;

use parking_lot::Mutex;

use crate::error::Result;
use crate::stt::{SttEngine, SttOutput};
use crate::telemetry::ErrorState;

pub struct InferenceService<S: SttEngine> {
    engine: S,
    error_state: Mutex<ErrorState>,
    retry_delay: Duration,
}

impl<S: SttEngine> InferenceService<S> {
    pub fn new(engine: S, safe_mode_threshold: u32, retry_delay: Duration) -> Self {
        Self {
            engine,
            error_state: Mutex::new(ErrorState::new(safe_mode_threshold)),
            retry_delay,
        }
    }

    /// Default retry delay matching the original pipeline's tuning: 320ms.
    pub fn with_defaults(engine: S) -> Self {
        Self::new(engine, 2, Duration::from_millis(320))
    }

    pub fn transcribe(&self, samples: &[f32]) -> Result<SttOutput> {
        match self.engine.transcribe(samples) {
            Ok(out) => {
                self.error_state.lock().record_success();
                Ok(out)
            }
            Err(_first_err) => {
                self.error_state.lock().record_failure();
                std::thread::sleep(self.retry_delay);
                match self.engine.transcribe(samples) {
                    Ok(out) => {
                        self.error_state.lock().record_success();
                        Ok(out)
                    }
                    Err(second_err) => {
                        self.error_state.lock().record_failure();
                        Err(second_err)
                    }
                }
            }
        }
    }

    pub fn safe_mode(&self) -> bool {
        self.error_state.lock().should_use_safe_mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FlakyEngine {
        fail_first_n: usize,
        calls: Arc<AtomicUsize>,
    }

    impl SttEngine for FlakyEngine {
        fn transcribe(&self, _samples: &[f32]) -> Result<SttOutput> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first_n {
                Err(PipelineError::Inference("flaky".into()))
            } else {
                Ok(SttOutput {
                    text: "ok".into(),
                    latency_ms: 10.0,
                })
            }
        }
    }

    #[test]
    fn succeeds_on_retry_after_one_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = InferenceService::new(
            FlakyEngine {
                fail_first_n: 1,
                calls: calls.clone(),
            },
            2,
            Duration::from_millis(1),
        );
        let out = svc.transcribe(&[0.0; 8]).unwrap();
        assert_eq!(out.text, "ok");
        assert!(!svc.safe_mode());
    }

    #[test]
    fn trips_safe_mode_after_two_consecutive_call_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = FlakyEngine {
            fail_first_n: usize::MAX,
            calls: calls.clone(),
        };
        let svc = InferenceService::new(engine, 2, Duration::from_millis(1));
        assert!(svc.transcribe(&[0.0; 8]).is_err());
        assert!(svc.safe_mode(), "both attempts in one call failed -> safe mode");
    }

    #[test]
    fn success_after_trip_clears_safe_mode() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = FlakyEngine {
            fail_first_n: 2,
            calls: calls.clone(),
        };
        let svc = InferenceService::new(engine, 2, Duration::from_millis(1));
        assert!(svc.transcribe(&[0.0; 8]).is_err());
        assert!(svc.safe_mode());
        let out = svc.transcribe(&[0.0; 8]);
        assert!(out.is_ok());
        assert!(!svc.safe_mode());
    }
}
