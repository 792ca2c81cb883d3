//! The shared request/response contract every tool implements.
//!
//! A tool is a [`ToolHandler`]: static metadata ([`ToolDefinition`]) plus an
//! async `handle(params, ctx)` that either returns the success payload or a
//! typed [`ToolError`]. The registry turns both into an
//! [`n8n_mcp_types::Envelope`].

use async_trait::async_trait;
use n8n_mcp_api::ApiError;
use n8n_mcp_types::{EnvelopeError, ErrorKind};
use schemars::JsonSchema;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Static description of a tool advertised to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the parameter object.
    pub input_schema: Map<String, Value>,
    /// Parameter values must never reach a log line.
    pub sensitive: bool,
    /// The tool only reads remote state.
    pub read_only: bool,
    /// The tool deletes or irreversibly changes remote state.
    pub destructive: bool,
}

impl ToolDefinition {
    /// Build a definition whose input schema is derived from `P`.
    pub fn for_params<P: JsonSchema>(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: input_schema_for::<P>(),
            sensitive: false,
            read_only: false,
            destructive: false,
        }
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }
}

/// Per-invocation state handed to a handler.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    /// Fired when the caller abandons the request.
    pub cancellation: CancellationToken,
}

impl InvocationContext {
    pub fn new(cancellation: CancellationToken) -> Self {
        Self { cancellation }
    }
}

/// Failure produced by a handler.
///
/// Every variant except [`ToolError::Unexpected`] is a structured error whose
/// kind passes through the registry unchanged. `Unexpected` is the "handler
/// crashed" path and surfaces as `ToolExecutionError`.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid parameters: {message}")]
    Validation { message: String },

    #[error("{message}")]
    Precondition { message: String, details: Option<Value> },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{context}: {source}")]
    Remote {
        context: String,
        #[source]
        source: ApiError,
    },

    #[error("{message}")]
    Execution {
        kind: ErrorKind,
        message: String,
        details: Option<Value>,
    },

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl ToolError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn precondition(message: impl Into<String>, details: Value) -> Self {
        Self::Precondition {
            message: message.into(),
            details: Some(details),
        }
    }

    /// Wrap a remote failure with operation context, keeping its kind.
    pub fn remote(context: impl Into<String>, source: ApiError) -> Self {
        Self::Remote {
            context: context.into(),
            source,
        }
    }

    pub fn timeout(message: impl Into<String>, details: Value) -> Self {
        Self::Execution {
            kind: ErrorKind::ExecutionTimeout,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn execution_failed(message: impl Into<String>, details: Value) -> Self {
        Self::Execution {
            kind: ErrorKind::ExecutionError,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn cancelled(message: impl Into<String>, details: Value) -> Self {
        Self::Execution {
            kind: ErrorKind::Cancelled,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::ValidationError,
            Self::Precondition { .. } => ErrorKind::PreconditionFailed,
            Self::Api(source) | Self::Remote { source, .. } => source.kind(),
            Self::Execution { kind, .. } => *kind,
            Self::Unexpected(_) => ErrorKind::ToolExecutionError,
        }
    }

    pub fn details(&self) -> Option<Value> {
        match self {
            Self::Validation { .. } | Self::Unexpected(_) => None,
            Self::Precondition { details, .. } | Self::Execution { details, .. } => details.clone(),
            Self::Api(source) | Self::Remote { source, .. } => source.details(),
        }
    }

    /// Error half of the failure envelope for this error.
    pub fn to_envelope_error(&self) -> EnvelopeError {
        let error = EnvelopeError::new(self.kind(), self.to_string());
        match self.details() {
            Some(details) => error.with_details(details),
            None => error,
        }
    }
}

/// One uniformly invoked operation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn definition(&self) -> &ToolDefinition;

    async fn handle(&self, params: Value, ctx: &InvocationContext) -> Result<Value, ToolError>;
}

/// Parameter object for tools that take no input.
#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NoParams {}

/// Validate a parameter bag by deserializing it into the tool's request type.
///
/// `null` is treated as an empty object so parameterless calls work.
pub fn parse_params<P: DeserializeOwned>(params: Value) -> Result<P, ToolError> {
    let params = match params {
        Value::Null => Value::Object(Map::new()),
        object @ Value::Object(_) => object,
        other => {
            return Err(ToolError::validation(format!(
                "parameters must be a JSON object, got {}",
                json_type_name(&other)
            )));
        }
    };
    serde_json::from_value(params).map_err(|error| ToolError::validation(error.to_string()))
}

/// JSON schema object for `P`, as advertised in tool listings.
pub fn input_schema_for<P: JsonSchema>() -> Map<String, Value> {
    match serde_json::to_value(schemars::schema_for!(P)) {
        Ok(Value::Object(mut schema)) => {
            schema.remove("$schema");
            schema
        }
        _ => {
            let mut fallback = Map::new();
            fallback.insert("type".to_string(), Value::String("object".to_string()));
            fallback
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    #[serde(rename_all = "camelCase", deny_unknown_fields)]
    struct Sample {
        workflow_id: String,
        limit: Option<u32>,
    }

    #[test]
    fn parses_camel_case_params() {
        let sample: Sample = parse_params(json!({ "workflowId": "7", "limit": 3 })).expect("valid params");
        assert_eq!(sample.workflow_id, "7");
        assert_eq!(sample.limit, Some(3));
    }

    #[test]
    fn rejects_unknown_fields_and_non_objects() {
        let error = parse_params::<Sample>(json!({ "workflowId": "7", "bogus": true })).expect_err("unknown field");
        assert_eq!(error.kind(), ErrorKind::ValidationError);

        let error = parse_params::<Sample>(json!(["7"])).expect_err("array params");
        assert!(error.to_string().contains("got array"));
    }

    #[test]
    fn null_params_mean_empty_object() {
        parse_params::<NoParams>(Value::Null).expect("no params");
    }

    #[test]
    fn schema_lists_properties() {
        let schema = input_schema_for::<Sample>();
        assert_eq!(schema["type"], json!("object"));
        assert!(schema["properties"].get("workflowId").is_some());
        assert!(schema.get("$schema").is_none());
    }

    #[test]
    fn remote_errors_keep_their_kind_and_cause() {
        let error = ToolError::remote("delete workflow", ApiError::from_status(403, None, r#"{"message":"forbidden"}"#));
        assert_eq!(error.kind(), ErrorKind::AuthorizationError);
        assert_eq!(error.to_string(), "delete workflow: not authorized: forbidden");
        assert_eq!(error.to_envelope_error().details, Some(json!({ "status": 403 })));
    }
}
