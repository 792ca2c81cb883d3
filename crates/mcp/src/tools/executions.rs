use std::sync::Arc;

use n8n_mcp_api::{ApiRequest, RemoteApi, resource_path};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::resource::ResourceTool;
use super::validate::{check_limit, require_id};
use crate::handler::{ToolError, ToolHandler};

/// Statuses the listing endpoint can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatusFilter {
    Error,
    Success,
    Waiting,
    Running,
    Canceled,
}

impl ExecutionStatusFilter {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Success => "success",
            Self::Waiting => "waiting",
            Self::Running => "running",
            Self::Canceled => "canceled",
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListExecutionsParams {
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub status: Option<ExecutionStatusFilter>,
    #[serde(default)]
    pub project_id: Option<String>,
    /// Include node run data (large).
    #[serde(default)]
    pub include_data: Option<bool>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetExecutionParams {
    pub execution_id: String,
    #[serde(default)]
    pub include_data: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExecutionIdParams {
    pub execution_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RetryExecutionParams {
    pub execution_id: String,
    /// Retry with the current workflow version instead of the one that ran.
    #[serde(default)]
    pub load_workflow: Option<bool>,
}

fn execution_path(execution_id: &str) -> Result<String, ToolError> {
    Ok(resource_path("executions", &require_id("executionId", execution_id)?))
}

fn list(params: ListExecutionsParams) -> Result<ApiRequest, ToolError> {
    let workflow_id = params
        .workflow_id
        .as_deref()
        .map(|id| require_id("workflowId", id))
        .transpose()?;
    Ok(ApiRequest::get("/executions")
        .query_opt("workflowId", workflow_id)
        .query_opt("status", params.status.map(|status| status.as_str()))
        .query_opt("projectId", params.project_id)
        .query_opt("includeData", params.include_data)
        .query_opt("limit", check_limit(params.limit)?)
        .query_opt("cursor", params.cursor))
}

fn get(params: GetExecutionParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::get(execution_path(&params.execution_id)?).query_opt("includeData", params.include_data))
}

fn delete(params: ExecutionIdParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::delete(execution_path(&params.execution_id)?))
}

fn stop(params: ExecutionIdParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::post(format!("{}/stop", execution_path(&params.execution_id)?)))
}

fn retry(params: RetryExecutionParams) -> Result<ApiRequest, ToolError> {
    let path = format!("{}/retry", execution_path(&params.execution_id)?);
    let request = ApiRequest::post(path);
    Ok(match params.load_workflow {
        Some(load_workflow) => request.with_body(json!({ "loadWorkflow": load_workflow })),
        None => request,
    })
}

pub fn tools(api: &Arc<dyn RemoteApi>) -> Vec<Arc<dyn ToolHandler>> {
    vec![
        ResourceTool::new(
            "list_executions",
            "List executions, optionally filtered by workflow, status or project. Paginated with limit/cursor.",
            api,
            list,
        )
        .read_only()
        .into_handler(),
        ResourceTool::new("get_execution", "Fetch one execution's status and, optionally, its run data.", api, get)
            .read_only()
            .into_handler(),
        ResourceTool::new("delete_execution", "Delete an execution record.", api, delete)
            .destructive()
            .into_handler(),
        ResourceTool::new(
            "stop_execution",
            "Ask the instance to stop a running execution. Use after execute_workflow timed out to cancel the run.",
            api,
            stop,
        )
        .into_handler(),
        ResourceTool::new("retry_execution", "Retry a failed execution on the instance.", api, retry).into_handler(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::parse_params;

    #[test]
    fn list_filters_by_status() {
        let params: ListExecutionsParams =
            parse_params(json!({ "workflowId": "7", "status": "error", "limit": 10 })).expect("params");
        let request = list(params).expect("request");
        assert_eq!(
            request.query,
            vec![
                ("workflowId".to_string(), "7".to_string()),
                ("status".to_string(), "error".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        assert!(parse_params::<ListExecutionsParams>(json!({ "status": "exploded" })).is_err());
    }

    #[test]
    fn stop_and_retry_target_sub_resources() {
        let stop_request = stop(ExecutionIdParams {
            execution_id: "42".to_string(),
        })
        .expect("stop");
        assert_eq!(stop_request.to_string(), "POST /executions/42/stop");

        let retry_request = retry(RetryExecutionParams {
            execution_id: "42".to_string(),
            load_workflow: Some(true),
        })
        .expect("retry");
        assert_eq!(retry_request.to_string(), "POST /executions/42/retry");
        assert_eq!(retry_request.body, Some(json!({ "loadWorkflow": true })));
    }
}
