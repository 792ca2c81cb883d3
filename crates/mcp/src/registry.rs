//! Name → handler dispatch with uniform failure handling.
//!
//! The registry is built once at startup and is read-only afterwards, so it
//! can be shared behind an `Arc` and invoked concurrently without locking.
//! [`ToolRegistry::invoke`] is the single entry point: whatever the handler
//! does (succeed, return a typed error, fail without structure, or panic),
//! the caller receives an [`Envelope`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use indexmap::IndexMap;
use n8n_mcp_types::{Envelope, EnvelopeError, ErrorKind};
use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::handler::{InvocationContext, ToolDefinition, ToolError, ToolHandler};
use crate::redaction::{contains_sensitive_fields, redact_sensitive};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("tool '{name}' is already registered")]
    DuplicateTool { name: String },

    #[error("tool names must not be empty")]
    EmptyName,
}

/// Collects handlers before the registry is frozen.
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: IndexMap<String, Arc<dyn ToolHandler>>,
}

impl std::fmt::Debug for ToolRegistryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistryBuilder")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistryBuilder {
    /// Register `handler` under the name in its definition.
    ///
    /// Duplicate names are a programming error and abort startup.
    pub fn register(mut self, handler: Arc<dyn ToolHandler>) -> Result<Self, RegistryError> {
        let name = handler.definition().name.clone();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.tools.contains_key(&name) {
            return Err(RegistryError::DuplicateTool { name });
        }
        self.tools.insert(name, handler);
        Ok(self)
    }

    pub fn register_all<I>(self, handlers: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Arc<dyn ToolHandler>>,
    {
        handlers.into_iter().try_fold(self, |builder, handler| builder.register(handler))
    }

    pub fn build(self) -> ToolRegistry {
        debug!(tool_count = self.tools.len(), "tool registry built");
        ToolRegistry { tools: self.tools }
    }
}

pub struct ToolRegistry {
    tools: IndexMap<String, Arc<dyn ToolHandler>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.list_tools()).finish()
    }
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Registered names in registration order.
    pub fn list_tools(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values().map(|handler| handler.definition())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invoke `name` with a fresh, never-cancelled context.
    pub async fn invoke(&self, name: &str, params: Value) -> Envelope {
        self.invoke_with(name, params, InvocationContext::default()).await
    }

    /// Invoke `name`, mapping every outcome to an envelope.
    pub async fn invoke_with(&self, name: &str, params: Value, ctx: InvocationContext) -> Envelope {
        let Some(handler) = self.tools.get(name) else {
            warn!(tool = name, "unknown tool requested");
            return Envelope::failure(
                EnvelopeError::new(ErrorKind::ToolNotFound, format!("tool '{name}' is not registered"))
                    .with_details(serde_json::json!({ "tool": name })),
            );
        };

        let definition = handler.definition();
        let sensitive_input = definition.sensitive || contains_sensitive_fields(&params);
        info!(tool = name, sensitive_input, "tool invocation started");
        if !sensitive_input {
            debug!(tool = name, params = %redact_sensitive(&params.to_string()), "tool parameters");
        }

        let started = Instant::now();
        let outcome = AssertUnwindSafe(handler.handle(params, &ctx)).catch_unwind().await;
        let envelope = match outcome {
            Ok(Ok(data)) => Envelope::success(data),
            Ok(Err(ToolError::Unexpected(source))) => {
                warn!(tool = name, error = %redact_sensitive(&format!("{source:#}")), "tool failed without a structured error");
                Envelope::failure(
                    EnvelopeError::new(ErrorKind::ToolExecutionError, format!("{source:#}"))
                        .with_details(serde_json::json!({ "tool": name })),
                )
            }
            Ok(Err(tool_error)) => Envelope::failure(tool_error.to_envelope_error()),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(tool = name, panic = %message, "tool handler panicked");
                Envelope::failure(
                    EnvelopeError::new(ErrorKind::ToolExecutionError, format!("tool '{name}' panicked: {message}"))
                        .with_details(serde_json::json!({ "tool": name })),
                )
            }
        };

        info!(
            tool = name,
            success = envelope.is_success(),
            error_kind = envelope.error_kind().map(|kind| kind.as_str()),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "tool invocation finished"
        );
        envelope
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
