use std::sync::Arc;

use async_trait::async_trait;
use n8n_mcp_api::{ApiRequest, RemoteApi, resource_path};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::resource::ResourceTool;
use super::validate::{check_limit, require_id, require_text};
use crate::handler::{InvocationContext, ToolDefinition, ToolError, ToolHandler, parse_params};
use crate::orchestrator::bounded;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListCredentialsParams {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCredentialParams {
    pub name: String,
    /// Credential type name, for example `githubApi`.
    #[serde(rename = "type")]
    pub credential_type: String,
    /// Secret fields as described by `get_credential_schema`.
    pub data: Map<String, Value>,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CredentialIdParams {
    pub credential_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CredentialSchemaParams {
    pub credential_type_name: String,
}

/// Lists credentials through whichever listing endpoint the instance offers.
pub struct ListCredentialsTool {
    definition: ToolDefinition,
    api: Arc<dyn RemoteApi>,
}

impl ListCredentialsTool {
    pub fn new(api: &Arc<dyn RemoteApi>) -> Self {
        Self {
            definition: ToolDefinition::for_params::<ListCredentialsParams>(
                "list_credentials",
                "List credentials (metadata only, never secret values). Paginated with limit/cursor.",
            )
            .read_only(),
            api: Arc::clone(api),
        }
    }
}

#[async_trait]
impl ToolHandler for ListCredentialsTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn handle(&self, params: Value, ctx: &InvocationContext) -> Result<Value, ToolError> {
        let params: ListCredentialsParams = parse_params(params)?;
        let limit = check_limit(params.limit)?;
        bounded(None, &ctx.cancellation, self.api.list_credentials(limit, params.cursor))
            .await
            .map_err(|_| ToolError::cancelled("list credentials was cancelled", json!({ "tool": "list_credentials" })))?
            .map_err(|error| ToolError::remote("list credentials", error))
    }
}

fn create(params: CreateCredentialParams) -> Result<ApiRequest, ToolError> {
    let body = json!({
        "name": require_text("name", &params.name)?,
        "type": require_id("type", &params.credential_type)?,
        "data": params.data,
    });
    Ok(ApiRequest::post("/credentials").with_body(body))
}

fn delete(params: CredentialIdParams) -> Result<ApiRequest, ToolError> {
    Ok(ApiRequest::delete(resource_path(
        "credentials",
        &require_id("credentialId", &params.credential_id)?,
    )))
}

fn schema(params: CredentialSchemaParams) -> Result<ApiRequest, ToolError> {
    let type_name = require_id("credentialTypeName", &params.credential_type_name)?;
    Ok(ApiRequest::get(resource_path("credentials/schema", &type_name)))
}

pub fn tools(api: &Arc<dyn RemoteApi>) -> Vec<Arc<dyn ToolHandler>> {
    vec![
        Arc::new(ListCredentialsTool::new(api)),
        ResourceTool::new(
            "create_credential",
            "Create a credential of a given type. The data object holds secrets and is never logged.",
            api,
            create,
        )
        .sensitive()
        .into_handler(),
        ResourceTool::new("delete_credential", "Delete a credential.", api, delete)
            .destructive()
            .into_handler(),
        ResourceTool::new(
            "get_credential_schema",
            "Describe the fields a credential type expects in its data object.",
            api,
            schema,
        )
        .read_only()
        .into_handler(),
    ]
}
