use std::sync::Arc;

use n8n_mcp_api::{ApiRequest, RemoteApi, resource_path};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::resource::ResourceTool;
use super::validate::{check_limit, require_id};
use crate::handler::{ToolError, ToolHandler};

/// Instance-level role assigned to an invited user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum GlobalRole {
    #[serde(rename = "global:admin")]
    Admin,
    #[default]
    #[serde(rename = "global:member")]
    Member,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListUsersParams {
    #[serde(default)]
    pub include_role: Option<bool>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetUserParams {
    /// User id or email address.
    pub id_or_email: String,
    #[serde(default)]
    pub include_role: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
    pub email: String,
    #[serde(default)]
    pub role: GlobalRole,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateUsersParams {
    /// Users to invite.
    pub users: Vec<NewUser>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserIdParams {
    pub id_or_email: String,
}

fn user_path(id_or_email: &str) -> Result<String, ToolError> {
    Ok(resource_path("users", &require_id("idOrEmail", id_or_email)?))
}

fn list(params: ListUsersParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::get("/users")
        .query_opt("includeRole", params.include_role)
        .query_opt("projectId", params.project_id)
        .query_opt("limit", check_limit(params.limit)?)
        .query_opt("cursor", params.cursor))
}

fn get(params: GetUserParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::get(user_path(&params.id_or_email)?).query_opt("includeRole", params.include_role))
}

fn create(params: CreateUsersParams) -> Result<ApiRequest, ToolError> {
    if params.users.is_empty() {
        return Err(ToolError::validation("users must contain at least one entry"));
    }
    for user in &params.users {
        if !user.email.contains('@') {
            return Err(ToolError::validation(format!("'{}' is not an email address", user.email)));
        }
    }
    let body = serde_json::to_value(&params.users).map_err(|error| ToolError::validation(error.to_string()))?;
    Ok(ApiRequest::post("/users").with_body(body))
}

fn delete(params: UserIdParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::delete(user_path(&params.id_or_email)?))
}

pub fn tools(api: &Arc<dyn RemoteApi>) -> Vec<Arc<dyn ToolHandler>> {
    vec![
        ResourceTool::new("list_users", "List users. Paginated with limit/cursor.", api, list)
            .read_only()
            .into_handler(),
        ResourceTool::new("get_user", "Fetch one user by id or email.", api, get)
            .read_only()
            .into_handler(),
        ResourceTool::new("create_users", "Invite one or more users by email.", api, create).into_handler(),
        ResourceTool::new("delete_user", "Delete a user.", api, delete)
            .destructive()
            .into_handler(),
    ]
}
