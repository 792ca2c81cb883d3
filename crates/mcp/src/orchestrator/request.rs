//! Parameters of `execute_workflow` and their resolution into a plan.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::settings::{
    ExecutionSettings, MAX_RETRIES_RANGE, RETRY_DELAY_SECONDS_RANGE, SettingsError, TIMEOUT_SECONDS_RANGE, check_range,
};
use crate::handler::ToolError;
use crate::tools::validate::require_id;

/// How the run is labelled on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    #[default]
    Manual,
    Trigger,
    Webhook,
}

impl TriggerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Trigger => "trigger",
            Self::Webhook => "webhook",
        }
    }
}

fn default_wait() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExecuteWorkflowRequest {
    /// Id of the workflow to run. It must be active.
    pub workflow_id: String,
    /// Input data handed to the run.
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub mode: TriggerMode,
    /// Poll until the run completes (default true). When false the call
    /// returns as soon as the run has been started.
    #[serde(default = "default_wait")]
    pub wait_for_completion: bool,
    /// Total time budget for waiting, 1..=300. Retries share this budget.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    /// Start a fresh run when a run ends in error.
    #[serde(default)]
    pub retry_on_failure: bool,
    /// Upper bound on fresh runs after the first, 1..=5.
    #[serde(default)]
    pub max_retries: Option<u64>,
    /// Pause before each retry, 1..=60.
    #[serde(default)]
    pub retry_delay_seconds: Option<u64>,
}

/// A request with every default filled in and every bound checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub workflow_id: String,
    pub payload: Option<Value>,
    pub mode: TriggerMode,
    pub wait_for_completion: bool,
    pub timeout_seconds: u64,
    pub retry_on_failure: bool,
    pub max_retries: u64,
    pub retry_delay: Duration,
    pub poll_interval: Duration,
}

impl ExecutionPlan {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ExecuteWorkflowRequest {
    pub fn into_plan(self, settings: &ExecutionSettings) -> Result<ExecutionPlan, ToolError> {
        let workflow_id = require_id("workflowId", &self.workflow_id)?;
        let timeout_seconds = check_range(
            "timeoutSeconds",
            self.timeout_seconds.unwrap_or(settings.default_timeout_seconds()),
            &TIMEOUT_SECONDS_RANGE,
        )
        .map_err(invalid)?;
        let max_retries = check_range(
            "maxRetries",
            self.max_retries.unwrap_or(settings.default_max_retries()),
            &MAX_RETRIES_RANGE,
        )
        .map_err(invalid)?;
        let retry_delay_seconds = check_range(
            "retryDelaySeconds",
            self.retry_delay_seconds.unwrap_or(settings.default_retry_delay_seconds()),
            &RETRY_DELAY_SECONDS_RANGE,
        )
        .map_err(invalid)?;

        Ok(ExecutionPlan {
            workflow_id,
            payload: self.data,
            mode: self.mode,
            wait_for_completion: self.wait_for_completion,
            timeout_seconds,
            retry_on_failure: self.retry_on_failure,
            max_retries,
            retry_delay: Duration::from_secs(retry_delay_seconds),
            poll_interval: settings.poll_interval(),
        })
    }
}

fn invalid(error: SettingsError) -> ToolError {
    ToolError::validation(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::parse_params;
    use serde_json::json;

    #[test]
    fn fills_defaults_from_settings() {
        let request: ExecuteWorkflowRequest = parse_params(json!({ "workflowId": "wf-1" })).expect("params");
        let plan = request.into_plan(&ExecutionSettings::default()).expect("plan");
        assert!(plan.wait_for_completion);
        assert!(!plan.retry_on_failure);
        assert_eq!(plan.mode, TriggerMode::Manual);
        assert_eq!(plan.timeout_seconds, 60);
        assert_eq!(plan.max_retries, 3);
        assert_eq!(plan.retry_delay, Duration::from_secs(5));
    }

    #[test]
    fn rejects_out_of_bounds_values() {
        for params in [
            json!({ "workflowId": "wf", "timeoutSeconds": 0 }),
            json!({ "workflowId": "wf", "timeoutSeconds": 301 }),
            json!({ "workflowId": "wf", "maxRetries": 6 }),
            json!({ "workflowId": "wf", "retryDelaySeconds": 0 }),
            json!({ "workflowId": "  " }),
        ] {
            let request: ExecuteWorkflowRequest = parse_params(params.clone()).expect("shape is valid");
            let error = request.into_plan(&ExecutionSettings::default()).expect_err("bounds");
            assert!(matches!(error, ToolError::Validation { .. }), "{params} gave {error:?}");
        }
    }

    #[test]
    fn mode_is_a_closed_set() {
        assert!(parse_params::<ExecuteWorkflowRequest>(json!({ "workflowId": "wf", "mode": "cron" })).is_err());
        let request: ExecuteWorkflowRequest =
            parse_params(json!({ "workflowId": "wf", "mode": "webhook" })).expect("webhook mode");
        assert_eq!(request.mode.as_str(), "webhook");
    }
}
