//! Tool registry, execution orchestrator and MCP server for the n8n public API.
//!
//! This crate provides the uniform tool contract ([`ToolHandler`]), the
//! registry that dispatches by name and guarantees every call yields an
//! [`n8n_mcp_types::Envelope`], the `execute_workflow` orchestrator with its
//! deadline-bounded poll/retry loop, the CRUD tool catalogue, and an `rmcp`
//! adapter serving the registry over stdio or streamable HTTP.

pub mod context;
pub mod handler;
pub mod orchestrator;
pub mod redaction;
pub mod registry;
pub mod server;
pub mod tools;

pub use context::ToolContext;
pub use handler::{InvocationContext, NoParams, ToolDefinition, ToolError, ToolHandler, input_schema_for, parse_params};
pub use orchestrator::{ExecuteWorkflowTool, ExecutionSettings, SettingsError};
pub use registry::{RegistryError, ToolRegistry, ToolRegistryBuilder};
pub use server::{McpHttpServer, N8nMcpServer, RunningMcpHttpServer, resolve_bind_address, serve_stdio};
pub use tools::default_registry;
