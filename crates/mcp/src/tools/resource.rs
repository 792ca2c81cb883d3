//! The one-request tool shape shared by the CRUD catalogue.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use n8n_mcp_api::{ApiRequest, RemoteApi};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::handler::{InvocationContext, ToolDefinition, ToolError, ToolHandler, parse_params};
use crate::orchestrator::{Interrupted, bounded};

/// Turns validated parameters into exactly one remote request.
pub type RequestBuilder<P> = fn(P) -> Result<ApiRequest, ToolError>;

/// A tool that validates `P`, sends one request and returns the body as is.
pub struct ResourceTool<P> {
    definition: ToolDefinition,
    api: Arc<dyn RemoteApi>,
    build: RequestBuilder<P>,
    _params: PhantomData<fn() -> P>,
}

impl<P> ResourceTool<P>
where
    P: DeserializeOwned + JsonSchema + Send + 'static,
{
    pub fn new(name: &str, description: &str, api: &Arc<dyn RemoteApi>, build: RequestBuilder<P>) -> Self {
        Self {
            definition: ToolDefinition::for_params::<P>(name, description),
            api: Arc::clone(api),
            build,
            _params: PhantomData,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.definition = self.definition.read_only();
        self
    }

    pub fn destructive(mut self) -> Self {
        self.definition = self.definition.destructive();
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.definition = self.definition.sensitive();
        self
    }

    pub fn into_handler(self) -> Arc<dyn ToolHandler> {
        Arc::new(self)
    }
}

#[async_trait]
impl<P> ToolHandler for ResourceTool<P>
where
    P: DeserializeOwned + JsonSchema + Send + 'static,
{
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn handle(&self, params: Value, ctx: &InvocationContext) -> Result<Value, ToolError> {
        let params: P = parse_params(params)?;
        let request = (self.build)(params)?;
        let action = self.definition.name.replace('_', " ");
        match bounded(None, &ctx.cancellation, self.api.send(request)).await {
            Ok(result) => result.map_err(|error| ToolError::remote(action, error)),
            Err(Interrupted::Cancelled | Interrupted::Deadline) => Err(ToolError::cancelled(
                format!("{action} was cancelled"),
                serde_json::json!({ "tool": self.definition.name }),
            )),
        }
    }
}
