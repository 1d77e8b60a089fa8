//! Outcome event wire format.
//!
//! ```json
//! { "decision": { "workerUrl": "http://w1" },
//!   "outcome":  { "statusCode": 204, "success": null } }
//! ```
//!
//! Every other field the router writes (context, latency, reward, ...) is
//! ignored.

use serde::{Deserialize, Deserializer};

use magnetar_core::WorkerId;

use crate::error::DecodeError;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    #[serde(default)]
    pub worker_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    #[serde(default)]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub success: Option<bool>,
}

/// One routing outcome as published by the router.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct OutcomeEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub decision: Decision,
    #[serde(default, deserialize_with = "null_as_default")]
    pub outcome: Outcome,
}

/// An explicit `null` section decodes the same as a missing one.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl OutcomeEvent {
    /// The explicit flag wins; otherwise any status in `[200, 500)` counts
    /// as success. A missing status is a transport failure.
    pub fn derive_success(&self) -> bool {
        if let Some(success) = self.outcome.success {
            return success;
        }
        matches!(self.outcome.status_code, Some(code) if (200..500).contains(&code))
    }

    /// Trimmed worker identity, if present and non-blank.
    pub fn worker(&self) -> Option<&str> {
        self.decision
            .worker_url
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
    }
}

/// A decoded, validated outcome ready to apply to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub worker: WorkerId,
    pub success: bool,
}

/// Decode one raw record.
pub fn decode(payload: &[u8]) -> Result<Observation, DecodeError> {
    let event: OutcomeEvent = serde_json::from_slice(payload)?;
    let worker = event.worker().ok_or(DecodeError::MissingWorker)?;
    Ok(Observation {
        worker: worker.to_string(),
        success: event.derive_success(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(json: &str) -> OutcomeEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn success_status_derives_success() {
        let obs = decode(br#"{"decision":{"workerUrl":"w1"},"outcome":{"statusCode":204}}"#).unwrap();
        assert_eq!(obs.worker, "w1");
        assert!(obs.success);
    }

    #[test]
    fn server_error_derives_failure() {
        assert!(!event(r#"{"outcome":{"statusCode":503}}"#).derive_success());
    }

    #[test]
    fn explicit_flag_overrides_status() {
        let e = event(r#"{"outcome":{"success":false},"statusCode":200}"#);
        assert!(!e.derive_success());

        let e = event(r#"{"outcome":{"statusCode":200,"success":false}}"#);
        assert!(!e.derive_success());

        let e = event(r#"{"outcome":{"statusCode":502,"success":true}}"#);
        assert!(e.derive_success());
    }

    #[test]
    fn null_flag_falls_back_to_status() {
        assert!(event(r#"{"outcome":{"statusCode":200,"success":null}}"#).derive_success());
    }

    #[test]
    fn status_boundaries() {
        let at = |code: i64| OutcomeEvent {
            outcome: Outcome {
                status_code: Some(code),
                success: None,
            },
            ..Default::default()
        };
        assert!(!at(199).derive_success());
        assert!(at(200).derive_success());
        assert!(at(404).derive_success());
        assert!(at(499).derive_success());
        assert!(!at(500).derive_success());
        assert!(!at(0).derive_success());
    }

    #[test]
    fn missing_outcome_is_failure() {
        let obs = decode(br#"{"decision":{"workerUrl":"w1"}}"#).unwrap();
        assert!(!obs.success);
    }

    #[test]
    fn null_outcome_is_failure() {
        let obs = decode(br#"{"decision":{"workerUrl":"w1"},"outcome":null}"#).unwrap();
        assert_eq!(obs.worker, "w1");
        assert!(!obs.success);
    }

    #[test]
    fn null_decision_is_missing_worker() {
        assert!(matches!(
            decode(br#"{"decision":null,"outcome":{"statusCode":200}}"#),
            Err(DecodeError::MissingWorker)
        ));
    }

    #[test]
    fn worker_url_is_trimmed() {
        let obs = decode(br#"{"decision":{"workerUrl":"  http://w1 "},"outcome":{"statusCode":200}}"#).unwrap();
        assert_eq!(obs.worker, "http://w1");
    }

    #[test]
    fn missing_or_blank_worker_is_rejected() {
        for payload in [
            r#"{"outcome":{"statusCode":200}}"#,
            r#"{"decision":{},"outcome":{"statusCode":200}}"#,
            r#"{"decision":{"workerUrl":""},"outcome":{"statusCode":200}}"#,
            r#"{"decision":{"workerUrl":"   "},"outcome":{"statusCode":200}}"#,
            r#"{"decision":{"workerUrl":null},"outcome":{"statusCode":200}}"#,
        ] {
            assert!(
                matches!(decode(payload.as_bytes()), Err(DecodeError::MissingWorker)),
                "accepted {payload}"
            );
        }
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(decode(b"not json"), Err(DecodeError::Json(_))));
        assert!(matches!(
            decode(br#"{"decision":{"workerUrl":7}}"#),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn full_router_record_decodes() {
        let payload = br#"{
            "version": 1,
            "telemetryId": "5c1e",
            "capturedAt": "2025-01-01T00:00:00Z",
            "context": {"requestId": "r1", "method": "GET", "path": "/", "hasRequestBody": false},
            "decision": {"algo": "roundRobin", "workerUrl": "http://w2", "targetUrl": "http://w2/", "workerCount": 3},
            "outcome": {"statusCode": 500, "latencyMs": 12, "success": false},
            "reward": 0
        }"#;
        let obs = decode(payload).unwrap();
        assert_eq!(obs.worker, "http://w2");
        assert!(!obs.success);
    }
}
