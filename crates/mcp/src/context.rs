use std::sync::Arc;

use n8n_mcp_api::RemoteApi;

use crate::orchestrator::ExecutionSettings;

/// Shared, read-only dependencies handed to every tool at construction.
#[derive(Clone)]
pub struct ToolContext {
    pub api: Arc<dyn RemoteApi>,
    pub execution: ExecutionSettings,
}

impl ToolContext {
    pub fn new(api: Arc<dyn RemoteApi>, execution: ExecutionSettings) -> Self {
        Self { api, execution }
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext").field("execution", &self.execution).finish_non_exhaustive()
    }
}
