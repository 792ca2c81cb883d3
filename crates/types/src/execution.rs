//! Remote job (execution) and workflow state models.
//!
//! These mirror the subset of the n8n public API payloads the orchestrator
//! reads. They are only ever produced by decoding remote responses; nothing in
//! this workspace mutates a job locally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Lifecycle status reported by the remote platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    #[serde(alias = "new")]
    Queued,
    Running,
    Success,
    Error,
    Crashed,
    Waiting,
    Canceled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ExecutionStatus {
    /// Status that ends the job in failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Error | Self::Crashed)
    }

    /// Status after which the remote job will not change anymore.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Crashed | Self::Canceled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Success => "success",
            Self::Error => "error",
            Self::Crashed => "crashed",
            Self::Waiting => "waiting",
            Self::Canceled => "canceled",
            Self::Unknown => "unknown",
        }
    }
}

/// One remote asynchronous run of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub status: ExecutionStatus,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default, deserialize_with = "optional_string_or_number", skip_serializing_if = "Option::is_none")]
    pub retry_of: Option<String>,
}

impl Execution {
    /// A freshly triggered job for which only the id is known.
    pub fn queued(id: impl Into<String>, workflow_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            workflow_id: Some(workflow_id.into()),
            status: ExecutionStatus::Queued,
            mode: None,
            started_at: None,
            stopped_at: None,
            finished: false,
            retry_of: None,
        }
    }

    /// Terminal from the caller's point of view: finished or in a terminal status.
    pub fn is_complete(&self) -> bool {
        self.finished || self.status.is_terminal()
    }

    /// Decode the response of a trigger call.
    ///
    /// Accepts a bare execution object, one wrapped in `data`, or a minimal
    /// `{"executionId": ...}` acknowledgement.
    pub fn from_trigger_response(response: &Value, workflow_id: &str) -> Option<Self> {
        let candidate = response.get("data").filter(|data| data.is_object()).unwrap_or(response);
        if candidate.get("id").is_some()
            && let Ok(mut execution) = serde_json::from_value::<Execution>(candidate.clone())
        {
            if execution.workflow_id.is_none() {
                execution.workflow_id = Some(workflow_id.to_string());
            }
            return Some(execution);
        }
        let execution_id = candidate.get("executionId").and_then(id_from_value)?;
        Some(Self::queued(execution_id, workflow_id))
    }
}

/// Minimal view of a workflow needed to decide whether it can run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowState {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub is_archived: bool,
}

impl WorkflowState {
    pub fn is_runnable(&self) -> bool {
        self.active && !self.is_archived
    }
}

fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(&value).ok_or_else(|| serde::de::Error::custom(format!("expected string or number id, got {value}")))
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(id_from_value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_numeric_ids_and_unknown_status() {
        let execution: Execution = serde_json::from_value(json!({
            "id": 1042,
            "workflowId": 7,
            "status": "something-new",
            "finished": false,
            "startedAt": "2026-01-02T03:04:05.000Z",
            "stoppedAt": null,
            "retryOf": null
        }))
        .expect("decode execution");
        assert_eq!(execution.id, "1042");
        assert_eq!(execution.workflow_id.as_deref(), Some("7"));
        assert_eq!(execution.status, ExecutionStatus::Unknown);
        assert!(execution.retry_of.is_none());
        assert!(!execution.is_complete());
    }

    #[test]
    fn new_is_an_alias_for_queued() {
        let status: ExecutionStatus = serde_json::from_value(json!("new")).expect("decode status");
        assert_eq!(status, ExecutionStatus::Queued);
    }

    #[test]
    fn failure_statuses_are_terminal() {
        assert!(ExecutionStatus::Error.is_failure());
        assert!(ExecutionStatus::Crashed.is_terminal());
        assert!(!ExecutionStatus::Canceled.is_failure());
        assert!(!ExecutionStatus::Waiting.is_terminal());
    }

    #[test]
    fn trigger_response_variants() {
        let bare = Execution::from_trigger_response(&json!({ "id": "5", "status": "running" }), "wf").expect("bare");
        assert_eq!(bare.id, "5");
        assert_eq!(bare.workflow_id.as_deref(), Some("wf"));
        assert_eq!(bare.status, ExecutionStatus::Running);

        let wrapped = Execution::from_trigger_response(&json!({ "data": { "executionId": 9 } }), "wf").expect("ack");
        assert_eq!(wrapped.id, "9");
        assert_eq!(wrapped.status, ExecutionStatus::Queued);

        assert!(Execution::from_trigger_response(&json!({ "ok": true }), "wf").is_none());
    }

    #[test]
    fn archived_workflows_are_not_runnable() {
        let workflow: WorkflowState =
            serde_json::from_value(json!({ "id": "1", "active": true, "isArchived": true })).expect("decode workflow");
        assert!(!workflow.is_runnable());
    }
}
