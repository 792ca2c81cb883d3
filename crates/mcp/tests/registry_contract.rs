use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use n8n_mcp::orchestrator::ExecutionSettings;
use n8n_mcp::{ToolContext, default_registry};
use n8n_mcp_api::{ApiError, ApiRequest, RemoteApi};
use n8n_mcp_types::{Envelope, ErrorKind};
use serde_json::{Value, json};

/// Minimal in-memory n8n: one active workflow whose runs succeed immediately.
#[derive(Default)]
struct FakeInstance {
    requests: AtomicUsize,
}

#[async_trait]
impl RemoteApi for FakeInstance {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match (request.method.as_str(), request.path.as_str()) {
            ("GET", "/workflows/wf-1") => Ok(json!({ "id": "wf-1", "name": "Sync", "active": true })),
            ("GET", "/workflows/wf-off") => Ok(json!({ "id": "wf-off", "active": false })),
            ("POST", "/workflows/wf-1/run") => Ok(json!({ "data": { "executionId": 11 } })),
            ("GET", "/executions/11") => Ok(json!({
                "id": 11,
                "workflowId": "wf-1",
                "status": "success",
                "finished": true,
                "mode": "manual"
            })),
            ("GET", "/workflows/missing") => Err(ApiError::from_status(404, None, r#"{"message":"Not found"}"#)),
            _ => Ok(json!({ "data": [], "nextCursor": null })),
        }
    }
}

fn registry(instance: Arc<FakeInstance>) -> n8n_mcp::ToolRegistry {
    let context = ToolContext::new(instance, ExecutionSettings::default());
    default_registry(&context).expect("catalogue names are unique")
}

fn assert_consistent(envelope: &Envelope) {
    assert!(envelope.is_consistent(), "inconsistent envelope: {envelope:?}");
    let wire = envelope.to_value();
    assert_eq!(wire["success"].as_bool(), Some(envelope.is_success()));
    assert_ne!(wire.get("data").is_some(), wire.get("error").is_some());
}

#[tokio::test]
async fn every_tool_answers_with_a_consistent_envelope() {
    let registry = registry(Arc::new(FakeInstance::default()));
    let names: Vec<String> = registry.list_tools().into_iter().map(str::to_string).collect();
    for name in names {
        for params in [Value::Null, json!({}), json!({ "bogus": 1 }), json!("not an object")] {
            let envelope = registry.invoke(&name, params).await;
            assert_consistent(&envelope);
        }
    }
}

#[tokio::test]
async fn unknown_names_yield_tool_not_found() {
    let registry = registry(Arc::new(FakeInstance::default()));
    for name in ["", "list_workflow", "LIST_WORKFLOWS", "rm -rf"] {
        let envelope = registry.invoke(name, json!({ "limit": 1 })).await;
        assert_consistent(&envelope);
        assert_eq!(envelope.error_kind(), Some(ErrorKind::ToolNotFound));
    }
}

#[tokio::test]
async fn validation_happens_before_any_remote_call() {
    let instance = Arc::new(FakeInstance::default());
    let registry = registry(Arc::clone(&instance));

    let envelope = registry.invoke("list_workflows", json!({ "limit": 0 })).await;
    assert_eq!(envelope.error_kind(), Some(ErrorKind::ValidationError));
    let envelope = registry.invoke("delete_workflow", json!({ "workflowId": " " })).await;
    assert_eq!(envelope.error_kind(), Some(ErrorKind::ValidationError));

    assert_eq!(instance.requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn dot_segment_ids_never_reach_the_remote() {
    let instance = Arc::new(FakeInstance::default());
    let registry = registry(Arc::clone(&instance));

    let calls = [
        ("get_credential_schema", json!({ "credentialTypeName": ".." })),
        ("update_workflow_tags", json!({ "workflowId": "..", "tagIds": ["t1"] })),
        ("stop_execution", json!({ "executionId": ".." })),
        ("get_workflow", json!({ "workflowId": "." })),
        ("execute_workflow", json!({ "workflowId": ".." })),
    ];
    for (name, params) in calls {
        let envelope = registry.invoke(name, params).await;
        assert_consistent(&envelope);
        assert_eq!(envelope.error_kind(), Some(ErrorKind::ValidationError), "{name}");
    }

    assert_eq!(instance.requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn remote_errors_keep_their_kind() {
    let registry = registry(Arc::new(FakeInstance::default()));
    let envelope = registry.invoke("get_workflow", json!({ "workflowId": "missing" })).await;
    assert_consistent(&envelope);
    assert_eq!(envelope.error_kind(), Some(ErrorKind::NotFound));
    assert!(
        envelope
            .error_ref()
            .is_some_and(|error| error.message.contains("Not found"))
    );
}

#[tokio::test(start_paused = true)]
async fn execute_workflow_runs_end_to_end_through_the_client_helpers() {
    let instance = Arc::new(FakeInstance::default());
    let registry = registry(Arc::clone(&instance));

    let envelope = registry
        .invoke("execute_workflow", json!({ "workflowId": "wf-1", "data": { "x": 1 } }))
        .await;
    assert_consistent(&envelope);
    let data = envelope.data().expect("success data");
    assert_eq!(data["id"], "11");
    assert_eq!(data["status"], "success");
    assert_eq!(data["waited"], true);
    // workflow read, trigger, one poll
    assert_eq!(instance.requests.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn inactive_workflows_fail_the_precondition() {
    let registry = registry(Arc::new(FakeInstance::default()));
    let envelope = registry.invoke("execute_workflow", json!({ "workflowId": "wf-off" })).await;
    assert_consistent(&envelope);
    assert_eq!(envelope.error_kind(), Some(ErrorKind::PreconditionFailed));
    let details = envelope.error_ref().and_then(|error| error.details.clone()).expect("details");
    assert_eq!(details["active"], false);
}

/// Collects formatted log output for assertions.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        let bytes = self.0.lock().map(|bytes| bytes.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut bytes) = self.0.lock() {
            bytes.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn sensitive_tool_parameters_never_reach_the_logs() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let registry = registry(Arc::new(FakeInstance::default()));
    let envelope = registry
        .invoke(
            "create_credential",
            json!({
                "name": "warehouse-login-7731",
                "type": "postgres",
                "data": { "user": "etl-operator-4410", "password": "hunter2-plaintext" }
            }),
        )
        .await;
    assert!(envelope.is_success());
    let envelope = registry
        .invoke("get_workflow", json!({ "workflowId": "wf-visible-5120" }))
        .await;
    assert_consistent(&envelope);

    let output = logs.contents();
    assert!(output.contains("create_credential"), "tool name should be logged: {output}");
    assert!(output.contains("sensitive_input=true"), "{output}");
    for value in ["warehouse-login-7731", "etl-operator-4410", "hunter2-plaintext", "postgres"] {
        assert!(!output.contains(value), "leaked {value}: {output}");
    }
    assert!(output.contains("wf-visible-5120"), "plain parameters are logged at debug: {output}");
}
