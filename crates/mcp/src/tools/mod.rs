//! The tool catalogue.
//!
//! Almost every tool is a [`resource::ResourceTool`]: a typed parameter struct
//! plus a function that turns it into one [`n8n_mcp_api::ApiRequest`].
//! Credential listing negotiates its endpoint and `execute_workflow` is the
//! orchestrator; both are dedicated handlers.

pub mod audit;
pub mod credentials;
pub mod executions;
pub mod resource;
pub mod tags;
pub mod users;
pub mod validate;
pub mod variables;
pub mod workflows;

use std::sync::Arc;

use crate::context::ToolContext;
use crate::handler::ToolHandler;
use crate::orchestrator::ExecuteWorkflowTool;
use crate::registry::{RegistryError, ToolRegistry};

/// Every handler, in advertised order.
pub fn catalogue(context: &ToolContext) -> Vec<Arc<dyn ToolHandler>> {
    let api = &context.api;
    let mut handlers = workflows::tools(api);
    handlers.push(Arc::new(ExecuteWorkflowTool::new(context)));
    handlers.extend(executions::tools(api));
    handlers.extend(credentials::tools(api));
    handlers.extend(tags::tools(api));
    handlers.extend(users::tools(api));
    handlers.extend(variables::tools(api));
    handlers.extend(audit::tools(api));
    handlers
}

/// Build the registry with the full catalogue.
pub fn default_registry(context: &ToolContext) -> Result<ToolRegistry, RegistryError> {
    Ok(ToolRegistry::builder().register_all(catalogue(context))?.build())
}
