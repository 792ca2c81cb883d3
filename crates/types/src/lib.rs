//! Shared type definitions for the n8n MCP server.
//!
//! - [`Envelope`]: the uniform `{success, data|error}` result of every tool call
//! - [`ErrorKind`]: the closed failure taxonomy carried by failure envelopes
//! - [`Execution`] / [`WorkflowState`]: remote job and workflow views

mod envelope;
mod error_kind;
mod execution;

pub use envelope::{Envelope, EnvelopeError};
pub use error_kind::ErrorKind;
pub use execution::{Execution, ExecutionStatus, WorkflowState};
