use std::sync::Arc;

use n8n_mcp_api::{ApiRequest, RemoteApi, resource_path};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use super::resource::ResourceTool;
use super::validate::{check_limit, require_id};
use crate::handler::{ToolError, ToolHandler};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListVariablesParams {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateVariableParams {
    /// Letters, digits and underscores only.
    pub key: String,
    pub value: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VariableIdParams {
    pub variable_id: String,
}

fn list(params: ListVariablesParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::get("/variables")
        .query_opt("limit", check_limit(params.limit)?)
        .query_opt("cursor", params.cursor))
}

fn create(params: CreateVariableParams) -> Result<ApiRequest, ToolError> {
    let key = require_id("key", &params.key)?;
    if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ToolError::validation(format!(
            "key '{key}' may only contain letters, digits and underscores"
        )));
    }
    Ok(ApiRequest::post("/variables").with_body(json!({ "key": key, "value": params.value })))
}

fn delete(params: VariableIdParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::delete(resource_path(
        "variables",
        &require_id("variableId", &params.variable_id)?,
    )))
}

pub fn tools(api: &Arc<dyn RemoteApi>) -> Vec<Arc<dyn ToolHandler>> {
    vec![
        ResourceTool::new("list_variables", "List instance variables. Paginated with limit/cursor.", api, list)
            .read_only()
            .into_handler(),
        ResourceTool::new(
            "create_variable",
            "Create an instance variable. The value is never logged.",
            api,
            create,
        )
        .sensitive()
        .into_handler(),
        ResourceTool::new("delete_variable", "Delete an instance variable.", api, delete)
            .destructive()
            .into_handler(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_restricted() {
        let error = create(CreateVariableParams {
            key: "db-url".to_string(),
            value: "postgres://".to_string(),
        })
        .expect_err("dash in key");
        assert!(matches!(error, ToolError::Validation { .. }));

        let request = create(CreateVariableParams {
            key: "DB_URL".to_string(),
            value: "postgres://".to_string(),
        })
        .expect("request");
        assert_eq!(request.body, Some(json!({ "key": "DB_URL", "value": "postgres://" })));
    }
}
