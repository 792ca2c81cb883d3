use std::sync::Arc;

use n8n_mcp_api::{ApiRequest, RemoteApi};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::resource::ResourceTool;
use crate::handler::{ToolError, ToolHandler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuditCategory {
    Credentials,
    Database,
    Nodes,
    Filesystem,
    Instance,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenerateAuditParams {
    /// Days without execution after which a workflow counts as abandoned.
    #[serde(default)]
    pub days_abandoned_workflow: Option<u32>,
    /// Limit the report to these categories; all when absent.
    #[serde(default)]
    pub categories: Option<Vec<AuditCategory>>,
}

fn generate(params: GenerateAuditParams) -> Result<ApiRequest, ToolError> {
    let mut options = Map::new();
    if let Some(days) = params.days_abandoned_workflow {
        if days == 0 {
            return Err(ToolError::validation("daysAbandonedWorkflow must be at least 1"));
        }
        options.insert("daysAbandonedWorkflow".to_string(), Value::from(days));
    }
    if let Some(categories) = params.categories {
        options.insert("categories".to_string(), json!(categories));
    }
    let request = ApiRequest::post("/audit");
    Ok(if options.is_empty() {
        request
    } else {
        request.with_body(json!({ "additionalOptions": options }))
    })
}

pub fn tools(api: &Arc<dyn RemoteApi>) -> Vec<Arc<dyn ToolHandler>> {
    vec![
        ResourceTool::new(
            "generate_audit",
            "Generate a security audit of the instance (credentials, database, nodes, filesystem, instance).",
            api,
            generate,
        )
        .read_only()
        .into_handler(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_are_nested() {
        let request = generate(GenerateAuditParams {
            days_abandoned_workflow: Some(30),
            categories: Some(vec![AuditCategory::Credentials, AuditCategory::Nodes]),
        })
        .expect("request");
        assert_eq!(
            request.body,
            Some(json!({ "additionalOptions": { "daysAbandonedWorkflow": 30, "categories": ["credentials", "nodes"] } }))
        );
    }

    #[test]
    fn no_options_means_no_body() {
        let request = generate(GenerateAuditParams::default()).expect("request");
        assert_eq!(request.body, None);
    }
}
