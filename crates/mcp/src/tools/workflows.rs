use std::sync::Arc;

use n8n_mcp_api::{ApiRequest, RemoteApi, resource_path};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::resource::ResourceTool;
use super::validate::{check_limit, require_id, require_text};
use crate::handler::{ToolError, ToolHandler};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListWorkflowsParams {
    /// Only active (true) or inactive (false) workflows.
    #[serde(default)]
    pub active: Option<bool>,
    /// Comma-separated tag names.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub exclude_pinned_data: Option<bool>,
    /// Page size, 1..=250.
    #[serde(default)]
    pub limit: Option<u32>,
    /// Cursor from a previous page's `nextCursor`.
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkflowIdParams {
    pub workflow_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetWorkflowParams {
    pub workflow_id: String,
    #[serde(default)]
    pub exclude_pinned_data: Option<bool>,
}

/// Workflow document as accepted by create and update.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkflowBody {
    pub name: String,
    /// Node definitions.
    pub nodes: Vec<Value>,
    /// Connection map keyed by source node name.
    pub connections: Map<String, Value>,
    #[serde(default)]
    pub settings: Option<Map<String, Value>>,
    #[serde(default)]
    pub static_data: Option<Value>,
}

impl WorkflowBody {
    fn into_json(self) -> Result<Value, ToolError> {
        let mut body = Map::new();
        body.insert("name".to_string(), Value::String(require_text("name", &self.name)?));
        body.insert("nodes".to_string(), Value::Array(self.nodes));
        body.insert("connections".to_string(), Value::Object(self.connections));
        body.insert("settings".to_string(), Value::Object(self.settings.unwrap_or_default()));
        if let Some(static_data) = self.static_data {
            body.insert("staticData".to_string(), static_data);
        }
        Ok(Value::Object(body))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateWorkflowParams {
    pub workflow_id: String,
    pub name: String,
    pub nodes: Vec<Value>,
    pub connections: Map<String, Value>,
    #[serde(default)]
    pub settings: Option<Map<String, Value>>,
    #[serde(default)]
    pub static_data: Option<Value>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateWorkflowTagsParams {
    pub workflow_id: String,
    /// The complete new tag set; an empty list removes every tag.
    pub tag_ids: Vec<String>,
}

fn workflow_path(workflow_id: &str) -> Result<String, ToolError> {
    Ok(resource_path("workflows", &require_id("workflowId", workflow_id)?))
}

fn list(params: ListWorkflowsParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::get("/workflows")
        .query_opt("active", params.active)
        .query_opt("tags", params.tags)
        .query_opt("name", params.name)
        .query_opt("projectId", params.project_id)
        .query_opt("excludePinnedData", params.exclude_pinned_data)
        .query_opt("limit", check_limit(params.limit)?)
        .query_opt("cursor", params.cursor))
}

fn get(params: GetWorkflowParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::get(workflow_path(&params.workflow_id)?).query_opt("excludePinnedData", params.exclude_pinned_data))
}

fn create(params: WorkflowBody) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::post("/workflows").with_body(params.into_json()?))
}

fn update(params: UpdateWorkflowParams) -> Result<ApiRequest, ToolError> {
    let path = workflow_path(&params.workflow_id)?;
    let workflow = WorkflowBody {
        name: params.name,
        nodes: params.nodes,
        connections: params.connections,
        settings: params.settings,
        static_data: params.static_data,
    };
    Ok(ApiRequest::put(path).with_body(workflow.into_json()?))
}

fn delete(params: WorkflowIdParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::delete(workflow_path(&params.workflow_id)?))
}

fn activate(params: WorkflowIdParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::post(format!("{}/activate", workflow_path(&params.workflow_id)?)))
}

fn deactivate(params: WorkflowIdParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::post(format!("{}/deactivate", workflow_path(&params.workflow_id)?)))
}

fn get_tags(params: WorkflowIdParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::get(format!("{}/tags", workflow_path(&params.workflow_id)?)))
}

fn update_tags(params: UpdateWorkflowTagsParams) -> Result<ApiRequest, ToolError> {
    let path = format!("{}/tags", workflow_path(&params.workflow_id)?);
    let tags = params
        .tag_ids
        .iter()
        .map(|tag_id| require_id("tagIds[]", tag_id).map(|id| json!({ "id": id })))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ApiRequest::put(path).with_body(Value::Array(tags)))
}

/// Workflow CRUD tools in catalogue order, excluding `execute_workflow`.
pub fn tools(api: &Arc<dyn RemoteApi>) -> Vec<Arc<dyn ToolHandler>> {
    vec![
        ResourceTool::new(
            "list_workflows",
            "List workflows, optionally filtered by active state, tags, name or project. Paginated with limit/cursor.",
            api,
            list,
        )
        .read_only()
        .into_handler(),
        ResourceTool::new("get_workflow", "Fetch one workflow with its nodes and connections.", api, get)
            .read_only()
            .into_handler(),
        ResourceTool::new(
            "create_workflow",
            "Create a workflow from name, nodes, connections and optional settings.",
            api,
            create,
        )
        .into_handler(),
        ResourceTool::new(
            "update_workflow",
            "Replace a workflow's name, nodes, connections and settings.",
            api,
            update,
        )
        .into_handler(),
        ResourceTool::new("delete_workflow", "Delete a workflow permanently.", api, delete)
            .destructive()
            .into_handler(),
        ResourceTool::new("activate_workflow", "Activate a workflow so its triggers run.", api, activate).into_handler(),
        ResourceTool::new("deactivate_workflow", "Deactivate a workflow.", api, deactivate).into_handler(),
        ResourceTool::new("get_workflow_tags", "List the tags attached to a workflow.", api, get_tags)
            .read_only()
            .into_handler(),
        ResourceTool::new(
            "update_workflow_tags",
            "Replace the set of tags attached to a workflow.",
            api,
            update_tags,
        )
        .into_handler(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::parse_params;
    use n8n_mcp_api::Method;

    #[test]
    fn list_passes_filters_as_query() {
        let params: ListWorkflowsParams =
            parse_params(json!({ "active": true, "tags": "prod,ops", "limit": 20 })).expect("params");
        let request = list(params).expect("request");
        assert_eq!(request.path, "/workflows");
        assert_eq!(
            request.query,
            vec![
                ("active".to_string(), "true".to_string()),
                ("tags".to_string(), "prod,ops".to_string()),
                ("limit".to_string(), "20".to_string()),
            ]
        );
    }

    #[test]
    fn list_rejects_oversized_pages() {
        let params: ListWorkflowsParams = parse_params(json!({ "limit": 1000 })).expect("params");
        assert!(matches!(list(params), Err(ToolError::Validation { .. })));
    }

    #[test]
    fn update_builds_put_with_settings_default() {
        let params: UpdateWorkflowParams = parse_params(json!({
            "workflowId": "abc",
            "name": "Nightly sync",
            "nodes": [],
            "connections": {}
        }))
        .expect("params");
        let request = update(params).expect("request");
        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.path, "/workflows/abc");
        assert_eq!(
            request.body,
            Some(json!({ "name": "Nightly sync", "nodes": [], "connections": {}, "settings": {} }))
        );
    }

    #[test]
    fn tag_update_sends_id_objects() {
        let params: UpdateWorkflowTagsParams =
            parse_params(json!({ "workflowId": "abc", "tagIds": ["t1", "t2"] })).expect("params");
        let request = update_tags(params).expect("request");
        assert_eq!(request.path, "/workflows/abc/tags");
        assert_eq!(request.body, Some(json!([{ "id": "t1" }, { "id": "t2" }])));
    }

    #[test]
    fn blank_ids_are_rejected_before_any_request() {
        let params: WorkflowIdParams = parse_params(json!({ "workflowId": "" })).expect("params");
        assert!(matches!(delete(params), Err(ToolError::Validation { .. })));
    }
}
