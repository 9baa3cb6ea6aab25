//! Schema validation for events crossing a stage boundary as loosely-typed
//! JSON (as opposed to the strongly-typed structs in [`crate::model`],
//! which the compiler already validates).
//!
//! This matters at exactly two seams: telemetry ingested from an external
//! `ResultFormatter`/HUD round-trip, and the raw JSON this crate itself
//! writes to the JSONL sinks. Both are checked against a fixed key list
//! before being trusted, mirroring the original pipeline's boundary schema
//! checks.

use serde_json::Value;

use crate::error::{PipelineError, Result};

pub const SILENCE_TRIGGER_FIELDS: &[&str] = &["type", "eventId", "audio", "sentinelTimestamp"];

pub const WORKER_RESULT_FIELDS: &[&str] = &[
    "eventId",
    "eventTimestamp",
    "sentinelTimestamp",
    "workerStartTs",
    "text",
    "promptId",
    "score",
    "whisperLatency",
    "intentLatency",
    "transportLatencyMs",
    "totalLatencyMs",
    "decision",
];

/// Checks that every field in `required` is present (any value, including
/// `null`) as a key of `value`. Returns a [`PipelineError::Schema`] naming
/// the first missing key.
pub fn ensure_schema_keys(value: &Value, required: &[&str]) -> Result<()> {
    let Value::Object(map) = value else {
        return Err(PipelineError::Schema("expected a JSON object".into()));
    };
    for key in required {
        if !map.contains_key(*key) {
            return Err(PipelineError::Schema(format!("missing required field: {key}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn passes_when_all_keys_present() {
        let v = json!({"type": "SILENCE_TRIGGER", "eventId": "x", "audio": [], "sentinelTimestamp": 1.0});
        assert!(ensure_schema_keys(&v, SILENCE_TRIGGER_FIELDS).is_ok());
    }

    #[test]
    fn fails_on_missing_key() {
        let v = json!({"type": "SILENCE_TRIGGER", "audio": []});
        let err = ensure_schema_keys(&v, SILENCE_TRIGGER_FIELDS).unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
    }

    #[test]
    fn fails_on_non_object() {
        let v = json!([1, 2, 3]);
        assert!(ensure_schema_keys(&v, SILENCE_TRIGGER_FIELDS).is_err());
    }

    #[test]
    fn worker_result_schema_matches_contract_field_count() {
        assert_eq!(WORKER_RESULT_FIELDS.len(), 12);
    }
}
