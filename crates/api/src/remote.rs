//! The capability interface the tool layer calls through.
//!
//! [`RemoteApi::send`] is the only required method; the typed helpers the
//! execution orchestrator relies on are provided on top of it so production
//! code gets them for free while tests can override them individually.

use async_trait::async_trait;
use n8n_mcp_types::{Execution, WorkflowState};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{ApiError, ApiRequest, resource_path};

/// Single-call access to the remote platform.
///
/// Implementations never retry and never poll.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Issue one request and return the decoded JSON body (`null` when empty).
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError>;

    /// Try endpoint variants in order and return the first success.
    ///
    /// A variant is skipped only when the remote reports it missing; any other
    /// failure (authentication, rate limiting, server errors) is returned as
    /// is. When every variant is missing the result is
    /// [`ApiError::Unsupported`] listing what was attempted.
    async fn send_first_supported(&self, probes: Vec<ApiRequest>) -> Result<Value, ApiError> {
        let mut attempts = Vec::with_capacity(probes.len());
        for probe in probes {
            let label = probe.to_string();
            match self.send(probe).await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_unsupported_endpoint() => {
                    debug!(endpoint = %label, %error, "endpoint variant unsupported, trying next");
                    attempts.push(label);
                }
                Err(error) => return Err(error),
            }
        }
        Err(ApiError::Unsupported { attempts })
    }

    /// List credentials, negotiating which listing endpoint the instance offers.
    async fn list_credentials(&self, limit: Option<u32>, cursor: Option<String>) -> Result<Value, ApiError> {
        self.send_first_supported(credential_list_probes(limit, cursor)).await
    }

    async fn get_workflow(&self, workflow_id: &str) -> Result<WorkflowState, ApiError> {
        let value = self.send(ApiRequest::get(resource_path("workflows", workflow_id))).await?;
        decode(value)
    }

    /// Start a new run of `workflow_id`.
    async fn trigger_workflow(&self, workflow_id: &str, payload: Option<Value>, mode: &str) -> Result<Execution, ApiError> {
        let mut body = Map::new();
        body.insert("mode".to_string(), Value::String(mode.to_string()));
        if let Some(payload) = payload {
            body.insert("data".to_string(), payload);
        }
        let path = format!("{}/run", resource_path("workflows", workflow_id));
        let value = self.send(ApiRequest::post(path).with_body(Value::Object(body))).await?;
        Execution::from_trigger_response(&value, workflow_id)
            .ok_or_else(|| ApiError::transport(format!("trigger response for workflow '{workflow_id}' carried no execution id")))
    }

    async fn get_execution(&self, execution_id: &str) -> Result<Execution, ApiError> {
        let request = ApiRequest::get(resource_path("executions", execution_id)).query("includeData", false);
        let value = self.send(request).await?;
        decode(value)
    }

    /// Ask the remote side to stop a running execution.
    async fn stop_execution(&self, execution_id: &str) -> Result<Value, ApiError> {
        let path = format!("{}/stop", resource_path("executions", execution_id));
        self.send(ApiRequest::post(path)).await
    }
}

/// Ordered endpoint variants for credential listing.
///
/// Older instances reject `GET /credentials`; some builds expose listing only
/// through a POST search endpoint.
pub fn credential_list_probes(limit: Option<u32>, cursor: Option<String>) -> Vec<ApiRequest> {
    let mut filter = Map::new();
    if let Some(limit) = limit {
        filter.insert("limit".to_string(), Value::from(limit));
    }
    if let Some(cursor) = cursor.as_ref() {
        filter.insert("cursor".to_string(), Value::String(cursor.clone()));
    }
    vec![
        ApiRequest::get("/credentials").query_opt("limit", limit).query_opt("cursor", cursor),
        ApiRequest::post("/credentials/search").with_body(Value::Object(filter.clone())),
        ApiRequest::post("/credentials/list").with_body(Value::Object(filter)),
    ]
}

/// Decode a response body into a typed model.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|error| ApiError::transport(format!("unexpected response shape: {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays canned results in order and records what was sent.
    struct Scripted {
        responses: Mutex<Vec<Result<Value, ApiError>>>,
        sent: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(mut responses: Vec<Result<Value, ApiError>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl RemoteApi for Scripted {
        async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(request.to_string());
            }
            self.responses
                .lock()
                .ok()
                .and_then(|mut responses| responses.pop())
                .unwrap_or_else(|| Err(ApiError::transport("script exhausted")))
        }
    }

    #[tokio::test]
    async fn probe_cascade_returns_first_success() {
        let api = Scripted::new(vec![
            Err(ApiError::from_status(405, None, "")),
            Ok(serde_json::json!({ "data": [] })),
        ]);
        let value = api.list_credentials(Some(10), None).await.expect("listing");
        assert_eq!(value, serde_json::json!({ "data": [] }));
        assert_eq!(api.sent(), vec!["GET /credentials", "POST /credentials/search"]);
    }

    #[tokio::test]
    async fn probe_cascade_stops_on_real_errors() {
        let api = Scripted::new(vec![Err(ApiError::from_status(401, None, ""))]);
        let error = api.list_credentials(None, None).await.expect_err("auth failure");
        assert!(matches!(error, ApiError::Authentication { .. }));
        assert_eq!(api.sent().len(), 1);
    }

    #[tokio::test]
    async fn probe_cascade_reports_every_attempt_when_unsupported() {
        let api = Scripted::new(vec![
            Err(ApiError::not_found("nope")),
            Err(ApiError::not_found("nope")),
            Err(ApiError::from_status(405, None, "")),
        ]);
        let error = api.list_credentials(None, None).await.expect_err("unsupported");
        assert_eq!(
            error,
            ApiError::Unsupported {
                attempts: vec![
                    "GET /credentials".to_string(),
                    "POST /credentials/search".to_string(),
                    "POST /credentials/list".to_string()
                ]
            }
        );
    }

    #[tokio::test]
    async fn trigger_without_execution_id_is_a_transport_error() {
        let api = Scripted::new(vec![Ok(serde_json::json!({ "accepted": true }))]);
        let error = api.trigger_workflow("wf", None, "manual").await.expect_err("no id");
        assert!(matches!(error, ApiError::UnknownTransport { .. }));
        assert_eq!(api.sent(), vec!["POST /workflows/wf/run"]);
    }
}
