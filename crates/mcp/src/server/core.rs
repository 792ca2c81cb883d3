use std::sync::Arc;

use anyhow::Result;
use n8n_mcp_types::Envelope;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ErrorData as McpError, Implementation, ListToolsResult, PaginatedRequestParams,
    ProtocolVersion, ServerCapabilities, ServerInfo, Tool, ToolAnnotations,
};
use rmcp::{RoleServer, ServerHandler, ServiceExt, service::RequestContext};
use serde_json::Value;
use tracing::info;

use crate::handler::{InvocationContext, ToolDefinition};
use crate::registry::ToolRegistry;

const INSTRUCTIONS: &str = "Tools for an n8n instance. Every result is an envelope {success, data} or \
{success:false, error:{kind, message, details}}.\nRUNNING WORKFLOWS:\n- execute_workflow starts a run of an active \
workflow and by default waits for it within timeoutSeconds.\n- error.kind=ExecutionTimeout means the wait ended, not \
the run: check get_execution later or call stop_execution.\n- error.kind=ExecutionError means the run failed after the \
retry policy was exhausted.\nLISTING:\n- list_* tools are paginated; pass nextCursor back as cursor.";

/// MCP face of the tool registry.
#[derive(Clone)]
pub struct N8nMcpServer {
    registry: Arc<ToolRegistry>,
}

impl N8nMcpServer {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn tools(&self) -> Vec<Tool> {
        self.registry.definitions().map(to_mcp_tool).collect()
    }
}

fn to_mcp_tool(definition: &ToolDefinition) -> Tool {
    let mut tool = Tool::new(
        definition.name.clone(),
        definition.description.clone(),
        Arc::new(definition.input_schema.clone()),
    );
    let mut annotations = ToolAnnotations::default();
    annotations.read_only_hint = Some(definition.read_only);
    annotations.destructive_hint = Some(definition.destructive);
    annotations.open_world_hint = Some(true);
    tool.annotations = Some(annotations);
    tool
}

/// Render an envelope as structured content; failures set `is_error`.
pub fn render_envelope(envelope: &Envelope) -> CallToolResult {
    let value = envelope.to_value();
    if envelope.is_success() {
        CallToolResult::structured(value)
    } else {
        CallToolResult::structured_error(value)
    }
}

impl ServerHandler for N8nMcpServer {
    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(ListToolsResult::with_all_items(self.tools())))
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            let params = request.arguments.map(Value::Object).unwrap_or(Value::Null);
            let envelope = self
                .registry
                .invoke_with(&request.name, params, InvocationContext::new(context.ct.clone()))
                .await;
            Ok(render_envelope(&envelope))
        }
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: "n8n-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("n8n MCP".to_string()),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }
}

/// Serve the registry over stdin/stdout until the client disconnects.
pub async fn serve_stdio(registry: Arc<ToolRegistry>) -> Result<()> {
    info!(tool_count = registry.len(), "serving MCP over stdio");
    let service = N8nMcpServer::new(registry).serve(rmcp::transport::stdio()).await?;
    let reason = service.waiting().await?;
    info!(?reason, "stdio session ended");
    Ok(())
}
