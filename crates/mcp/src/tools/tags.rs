use std::sync::Arc;

use n8n_mcp_api::{ApiRequest, RemoteApi, resource_path};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use super::resource::ResourceTool;
use super::validate::{check_limit, require_id, require_text};
use crate::handler::{ToolError, ToolHandler};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListTagsParams {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TagIdParams {
    pub tag_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateTagParams {
    pub name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateTagParams {
    pub tag_id: String,
    pub name: String,
}

fn tag_path(tag_id: &str) -> Result<String, ToolError> {
    Ok(resource_path("tags", &require_id("tagId", tag_id)?))
}

fn list(params: ListTagsParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::get("/tags")
        .query_opt("limit", check_limit(params.limit)?)
        .query_opt("cursor", params.cursor))
}

fn get(params: TagIdParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::get(tag_path(&params.tag_id)?))
}

fn create(params: CreateTagParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::post("/tags").with_body(json!({ "name": require_text("name", &params.name)? })))
}

fn update(params: UpdateTagParams) -> Result<ApiRequest, ToolError> {
    let path = tag_path(&params.tag_id)?;
    Ok(ApiRequest::put(path).with_body(json!({ "name": require_text("name", &params.name)? })))
}

fn delete(params: TagIdParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::delete(tag_path(&params.tag_id)?))
}

pub fn tools(api: &Arc<dyn RemoteApi>) -> Vec<Arc<dyn ToolHandler>> {
    vec![
        ResourceTool::new("list_tags", "List tags. Paginated with limit/cursor.", api, list)
            .read_only()
            .into_handler(),
        ResourceTool::new("get_tag", "Fetch one tag.", api, get).read_only().into_handler(),
        ResourceTool::new("create_tag", "Create a tag. Names are unique per instance.", api, create).into_handler(),
        ResourceTool::new("update_tag", "Rename a tag.", api, update).into_handler(),
        ResourceTool::new("delete_tag", "Delete a tag and detach it from every workflow.", api, delete)
            .destructive()
            .into_handler(),
    ]
}
