//! Closed error taxonomy shared by every layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification attached to every failure envelope.
///
/// The set is closed: handlers, the remote client, and the registry all map
/// their failures onto one of these kinds so callers can branch on `kind`
/// without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No tool is registered under the requested name.
    ToolNotFound,
    /// A handler failed without producing a structured error (or panicked).
    ToolExecutionError,
    /// Input parameters failed schema or bounds validation.
    ValidationError,
    /// Remote state disallows the operation (for example an inactive workflow).
    PreconditionFailed,
    /// The remote resource does not exist.
    NotFound,
    /// The remote API rejected the credential.
    AuthenticationError,
    /// The credential lacks permission for the operation.
    AuthorizationError,
    /// The remote API is throttling requests.
    RateLimited,
    /// The remote API failed with a 5xx response.
    RemoteServerError,
    /// Transport failure or an unexpected response that fits no other kind.
    UnknownTransportError,
    /// None of the known endpoint variants is supported by the remote instance.
    Unsupported,
    /// A waiting execution did not complete before its deadline.
    ExecutionTimeout,
    /// The execution finished in an error state after the retry policy ran out.
    ExecutionError,
    /// The invocation was cancelled by the caller.
    Cancelled,
}

impl ErrorKind {
    /// Wire label, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToolNotFound => "ToolNotFound",
            Self::ToolExecutionError => "ToolExecutionError",
            Self::ValidationError => "ValidationError",
            Self::PreconditionFailed => "PreconditionFailed",
            Self::NotFound => "NotFound",
            Self::AuthenticationError => "AuthenticationError",
            Self::AuthorizationError => "AuthorizationError",
            Self::RateLimited => "RateLimited",
            Self::RemoteServerError => "RemoteServerError",
            Self::UnknownTransportError => "UnknownTransportError",
            Self::Unsupported => "Unsupported",
            Self::ExecutionTimeout => "ExecutionTimeout",
            Self::ExecutionError => "ExecutionError",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_form_matches_label() {
        for kind in [
            ErrorKind::ToolNotFound,
            ErrorKind::ToolExecutionError,
            ErrorKind::ValidationError,
            ErrorKind::PreconditionFailed,
            ErrorKind::NotFound,
            ErrorKind::AuthenticationError,
            ErrorKind::AuthorizationError,
            ErrorKind::RateLimited,
            ErrorKind::RemoteServerError,
            ErrorKind::UnknownTransportError,
            ErrorKind::Unsupported,
            ErrorKind::ExecutionTimeout,
            ErrorKind::ExecutionError,
            ErrorKind::Cancelled,
        ] {
            let value = serde_json::to_value(kind).expect("serialize kind");
            assert_eq!(value, serde_json::json!(kind.as_str()));
        }
    }
}
