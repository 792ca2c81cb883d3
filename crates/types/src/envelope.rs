//! Uniform tool result envelope.
//!
//! Every tool invocation produces exactly one [`Envelope`]. On the wire it is
//! either `{"success": true, "data": ...}` or
//! `{"success": false, "error": {"message": ..., "kind": ...}}`. The fields
//! are private so the `success` flag can never disagree with which payload is
//! present; deserialization rejects inconsistent documents.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ErrorKind;

/// Error half of a failure envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub message: String,
    pub kind: ErrorKind,
    /// Optional machine-readable context (status code, execution id, retry chain).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl EnvelopeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEnvelope", into = "RawEnvelope")]
pub struct Envelope {
    success: bool,
    data: Option<Value>,
    error: Option<EnvelopeError>,
}

impl Envelope {
    /// Successful envelope carrying `data`.
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failure envelope carrying `error`.
    pub fn failure(error: EnvelopeError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }

    /// Shorthand for a failure without details.
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::failure(EnvelopeError::new(kind, message))
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn error_ref(&self) -> Option<&EnvelopeError> {
        self.error.as_ref()
    }

    /// Kind of the failure, if this is a failure envelope.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|error| error.kind)
    }

    /// Exactly one of `data`/`error` is present and `success` agrees with it.
    pub fn is_consistent(&self) -> bool {
        match (self.success, self.data.is_some(), self.error.is_some()) {
            (true, true, false) | (false, false, true) => true,
            _ => false,
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Serialize, Deserialize)]
struct RawEnvelope {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<EnvelopeError>,
}

impl TryFrom<RawEnvelope> for Envelope {
    type Error = String;

    fn try_from(raw: RawEnvelope) -> Result<Self, Self::Error> {
        match (raw.success, raw.data, raw.error) {
            // `"data": null` deserializes as `None`
            (true, data, None) => Ok(Envelope::success(data.unwrap_or(Value::Null))),
            (false, None, Some(error)) => Ok(Envelope::failure(error)),
            (success, data, error) => Err(format!(
                "inconsistent envelope: success={success}, data present={}, error present={}",
                data.is_some(),
                error.is_some()
            )),
        }
    }
}

impl From<Envelope> for RawEnvelope {
    fn from(envelope: Envelope) -> Self {
        Self {
            success: envelope.success,
            data: envelope.data,
            error: envelope.error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_serializes_without_error() {
        let envelope = Envelope::success(json!({ "id": "1" }));
        assert!(envelope.is_consistent());
        assert_eq!(envelope.to_value(), json!({ "success": true, "data": { "id": "1" } }));
    }

    #[test]
    fn failure_envelope_serializes_kind_and_details() {
        let envelope = Envelope::failure(
            EnvelopeError::new(ErrorKind::ExecutionTimeout, "timed out").with_details(json!({ "executionId": "7" })),
        );
        assert!(envelope.is_consistent());
        assert!(!envelope.is_success());
        assert_eq!(
            envelope.to_value(),
            json!({
                "success": false,
                "error": { "message": "timed out", "kind": "ExecutionTimeout", "details": { "executionId": "7" } }
            })
        );
    }

    #[test]
    fn null_data_still_counts_as_present() {
        let envelope = Envelope::success(Value::Null);
        assert!(envelope.is_consistent());
        assert_eq!(envelope.to_value(), json!({ "success": true, "data": null }));
    }

    #[test]
    fn rejects_inconsistent_documents() {
        let both = json!({ "success": true, "data": 1, "error": { "message": "x", "kind": "NotFound" } });
        assert!(serde_json::from_value::<Envelope>(both).is_err());

        let lying = json!({ "success": true, "error": { "message": "x", "kind": "NotFound" } });
        assert!(serde_json::from_value::<Envelope>(lying).is_err());

        let ok = json!({ "success": false, "error": { "message": "x", "kind": "NotFound" } });
        let parsed: Envelope = serde_json::from_value(ok).expect("consistent envelope");
        assert_eq!(parsed.error_kind(), Some(ErrorKind::NotFound));
    }
}
