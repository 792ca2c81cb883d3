//! Typed errors produced by the remote API client.

use n8n_mcp_types::ErrorKind;
use serde_json::Value;
use thiserror::Error;

const MAX_BODY_EXCERPT_CHARS: usize = 300;

/// Failure of a single remote call, already classified.
///
/// Transport exceptions never leave the client raw; every outcome is one of
/// these variants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    #[error("not authorized: {message}")]
    Authorization { message: String },

    #[error("not found: {message}")]
    NotFound { status: u16, message: String },

    #[error("rejected by remote validation: {message}")]
    Validation { status: u16, message: String },

    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after_secs: Option<u64>,
    },

    #[error("remote server error ({status}): {message}")]
    RemoteServer { status: u16, message: String },

    #[error("transport error: {message}")]
    UnknownTransport { message: String },

    #[error("no supported endpoint variant; tried {}", attempts.join(", "))]
    Unsupported { attempts: Vec<String> },
}

impl ApiError {
    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::UnknownTransport { message: message.into() }
    }

    /// Create a not-found error for a 404 response.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            status: 404,
            message: message.into(),
        }
    }

    /// Map a `reqwest` failure without exposing it.
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        let reason = if error.is_timeout() {
            "request timed out"
        } else if error.is_connect() {
            "connection failed"
        } else if error.is_decode() {
            "response could not be decoded"
        } else if error.is_body() {
            "request body error"
        } else {
            "request failed"
        };
        Self::transport(format!("{reason}: {error}"))
    }

    /// Classify a non-success HTTP response.
    pub fn from_status(status: u16, retry_after_secs: Option<u64>, body: &str) -> Self {
        let message = remote_message(body).unwrap_or_else(|| format!("HTTP {status}"));
        match status {
            400 | 422 => Self::Validation { status, message },
            401 => Self::Authentication { message },
            403 => Self::Authorization { message },
            404 | 405 => Self::NotFound { status, message },
            429 => Self::RateLimited {
                message,
                retry_after_secs,
            },
            500..=599 => Self::RemoteServer { status, message },
            _ => Self::transport(format!("unexpected HTTP {status}: {message}")),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication { .. } => ErrorKind::AuthenticationError,
            Self::Authorization { .. } => ErrorKind::AuthorizationError,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation { .. } => ErrorKind::ValidationError,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::RemoteServer { .. } => ErrorKind::RemoteServerError,
            Self::UnknownTransport { .. } => ErrorKind::UnknownTransportError,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
        }
    }

    /// HTTP status behind the error, when there was a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { .. } => Some(401),
            Self::Authorization { .. } => Some(403),
            Self::NotFound { status, .. } | Self::Validation { status, .. } | Self::RemoteServer { status, .. } => {
                Some(*status)
            }
            Self::RateLimited { .. } => Some(429),
            Self::UnknownTransport { .. } | Self::Unsupported { .. } => None,
        }
    }

    /// Whether the endpoint variant itself is missing on the remote instance.
    ///
    /// Only these errors let a probe cascade move on to the next variant.
    pub fn is_unsupported_endpoint(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Unsupported { .. })
    }

    /// Machine-readable context for failure envelopes.
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::RateLimited {
                retry_after_secs: Some(seconds),
                ..
            } => Some(serde_json::json!({ "status": 429, "retryAfterSeconds": seconds })),
            Self::Unsupported { attempts } => Some(serde_json::json!({ "attempts": attempts })),
            other => other.status().map(|status| serde_json::json!({ "status": status })),
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Prefers the `message` (or `error`) field of a JSON body; falls back to a
/// truncated excerpt of the raw text. Returns `None` for empty bodies.
pub fn remote_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        for key in ["message", "error", "description"] {
            if let Some(text) = value.get(key).and_then(Value::as_str)
                && !text.is_empty()
            {
                return Some(text.to_string());
            }
        }
    }
    let excerpt: String = trimmed.chars().take(MAX_BODY_EXCERPT_CHARS).collect();
    Some(excerpt)
}
