//! `execute_workflow`: start a remote run and optionally drive it to completion.
//!
//! The run moves through `triggered → polling → {succeeded, failed, retrying,
//! timed out}`. A failed run is retried by triggering a *new* run, up to
//! `maxRetries` times, and every retry stays under the deadline computed when
//! the call started; retries never extend it. All suspension (remote calls,
//! poll pauses, retry delays) goes through [`wait::bounded`], which also
//! observes the caller's cancellation token.
//!
//! The loop only reads remote state. Reaching the deadline is reported as
//! `ExecutionTimeout` and says nothing about the run itself, which may still
//! complete remotely; stopping it is the separate `stop_execution` tool.

mod request;
mod settings;
mod wait;

use std::sync::Arc;

use async_trait::async_trait;
use n8n_mcp_api::RemoteApi;
use n8n_mcp_types::Execution;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub use request::{ExecuteWorkflowRequest, ExecutionPlan, TriggerMode};
pub use settings::{
    DEFAULT_MAX_RETRIES, DEFAULT_POLL_INTERVAL, DEFAULT_RETRY_DELAY_SECONDS, DEFAULT_TIMEOUT_SECONDS, ExecutionSettings,
    MAX_RETRIES_RANGE, RETRY_DELAY_SECONDS_RANGE, SettingsError, TIMEOUT_SECONDS_RANGE, check_range,
};
pub use wait::{Interrupted, bounded, pause};

use crate::context::ToolContext;
use crate::handler::{InvocationContext, ToolDefinition, ToolError, ToolHandler, parse_params};

const DESCRIPTION: &str = "Run an active workflow. With waitForCompletion (default) the call polls until the run \
finishes, optionally retrying failed runs with fresh runs, all within timeoutSeconds. A timeout means the wait \
ended, not the run; use get_execution or stop_execution afterwards.";

/// One started remote run, in trigger order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct Attempt {
    execution_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_of: Option<String>,
}

/// Loop-local bookkeeping for one waiting call. Never shared or persisted.
struct PollState {
    started: Instant,
    deadline: Instant,
    current: Execution,
    attempts: Vec<Attempt>,
    retries_used: u64,
}

impl PollState {
    fn new(started: Instant, deadline: Instant, first: Execution) -> Self {
        Self {
            started,
            deadline,
            attempts: vec![Attempt {
                execution_id: first.id.clone(),
                retry_of: None,
            }],
            current: first,
            retries_used: 0,
        }
    }

    fn record_retry(&mut self, next: Execution) {
        self.attempts.push(Attempt {
            execution_id: next.id.clone(),
            retry_of: Some(self.current.id.clone()),
        });
        self.current = next;
        self.retries_used += 1;
    }

    fn into_success(self) -> Value {
        let mut data = execution_fields(&self.current);
        data.insert("attempts".to_string(), json!(self.attempts));
        data.insert("retriesUsed".to_string(), json!(self.retries_used));
        data.insert("waited".to_string(), Value::Bool(true));
        Value::Object(data)
    }

    fn into_failure(self, plan: &ExecutionPlan) -> ToolError {
        let job = &self.current;
        let retry_note = if !plan.retry_on_failure {
            "retry on failure is disabled".to_string()
        } else {
            format!("{} of {} retries used", self.retries_used, plan.max_retries)
        };
        ToolError::execution_failed(
            format!(
                "workflow '{}' run '{}' ended with status '{}' ({retry_note})",
                plan.workflow_id,
                job.id,
                job.status.as_str()
            ),
            json!({
                "execution": Value::Object(execution_fields(job)),
                "attempts": self.attempts,
                "retriesUsed": self.retries_used,
            }),
        )
    }
}

/// What one observation of a run means for the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observation {
    Completed,
    Failed,
    Pending,
}

fn classify(job: &Execution) -> Observation {
    if job.status.is_failure() {
        Observation::Failed
    } else if job.is_complete() {
        Observation::Completed
    } else {
        Observation::Pending
    }
}

fn execution_fields(job: &Execution) -> Map<String, Value> {
    match serde_json::to_value(job) {
        Ok(Value::Object(fields)) => fields,
        _ => {
            let mut fields = Map::new();
            fields.insert("id".to_string(), Value::String(job.id.clone()));
            fields.insert("status".to_string(), Value::String(job.status.as_str().to_string()));
            fields
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Map an interrupted wait to the caller-facing error.
fn interrupted(reason: Interrupted, plan: &ExecutionPlan, started: Instant, state: Option<&PollState>) -> ToolError {
    let last = state.map(|state| &state.current);
    let details = json!({
        "workflowId": plan.workflow_id,
        "timeoutSeconds": plan.timeout_seconds,
        "elapsedMs": elapsed_ms(started),
        "lastExecutionId": last.map(|job| job.id.clone()),
        "lastStatus": last.map(|job| job.status.as_str()),
        "attempts": state.map(|state| json!(state.attempts)).unwrap_or_else(|| json!([])),
    });
    match reason {
        Interrupted::Deadline => {
            warn!(
                workflow_id = %plan.workflow_id,
                execution_id = last.map(|job| job.id.as_str()),
                timeout_seconds = plan.timeout_seconds,
                "stopped waiting for workflow run at deadline"
            );
            ToolError::timeout(
                format!(
                    "workflow '{}' did not complete within {}s; the run may still finish remotely",
                    plan.workflow_id, plan.timeout_seconds
                ),
                details,
            )
        }
        Interrupted::Cancelled => {
            info!(workflow_id = %plan.workflow_id, execution_id = last.map(|job| job.id.as_str()), "workflow run wait cancelled");
            ToolError::cancelled(format!("waiting for workflow '{}' was cancelled", plan.workflow_id), details)
        }
    }
}

pub struct ExecuteWorkflowTool {
    definition: ToolDefinition,
    api: Arc<dyn RemoteApi>,
    settings: ExecutionSettings,
}

impl ExecuteWorkflowTool {
    pub const NAME: &'static str = "execute_workflow";

    pub fn new(context: &ToolContext) -> Self {
        Self {
            definition: ToolDefinition::for_params::<ExecuteWorkflowRequest>(Self::NAME, DESCRIPTION),
            api: Arc::clone(&context.api),
            settings: context.execution,
        }
    }

    /// The target must exist and be active before anything is started.
    async fn ensure_runnable(
        &self,
        plan: &ExecutionPlan,
        deadline: Option<Instant>,
        cancel: &CancellationToken,
        started: Instant,
    ) -> Result<(), ToolError> {
        let workflow = bounded(deadline, cancel, self.api.get_workflow(&plan.workflow_id))
            .await
            .map_err(|reason| interrupted(reason, plan, started, None))?
            .map_err(|error| ToolError::remote(format!("load workflow '{}'", plan.workflow_id), error))?;
        if workflow.is_runnable() {
            return Ok(());
        }
        let reason = if workflow.is_archived { "archived" } else { "not active" };
        Err(ToolError::precondition(
            format!("workflow '{}' cannot run: it is {reason}", plan.workflow_id),
            json!({
                "workflowId": workflow.id,
                "active": workflow.active,
                "isArchived": workflow.is_archived,
            }),
        ))
    }

    async fn trigger(
        &self,
        plan: &ExecutionPlan,
        deadline: Option<Instant>,
        cancel: &CancellationToken,
        started: Instant,
        state: Option<&PollState>,
    ) -> Result<Execution, ToolError> {
        let trigger = self
            .api
            .trigger_workflow(&plan.workflow_id, plan.payload.clone(), plan.mode.as_str());
        let job = bounded(deadline, cancel, trigger)
            .await
            .map_err(|reason| interrupted(reason, plan, started, state))?
            .map_err(|error| ToolError::remote(format!("trigger workflow '{}'", plan.workflow_id), error))?;
        info!(
            workflow_id = %plan.workflow_id,
            execution_id = %job.id,
            attempt = state.map_or(1, |state| state.attempts.len() + 1),
            elapsed_ms = elapsed_ms(started),
            "workflow run triggered"
        );
        Ok(job)
    }

    async fn wait_for_completion(
        &self,
        plan: &ExecutionPlan,
        mut state: PollState,
        cancel: &CancellationToken,
    ) -> Result<Value, ToolError> {
        let deadline = Some(state.deadline);
        let started = state.started;
        loop {
            let observed = bounded(deadline, cancel, self.api.get_execution(&state.current.id))
                .await
                .map_err(|reason| interrupted(reason, plan, started, Some(&state)))?
                .map_err(|error| ToolError::remote(format!("poll execution '{}'", state.current.id), error))?;
            state.current = observed;
            debug!(
                execution_id = %state.current.id,
                status = state.current.status.as_str(),
                finished = state.current.finished,
                elapsed_ms = elapsed_ms(started),
                "execution polled"
            );

            match classify(&state.current) {
                Observation::Completed => {
                    info!(
                        execution_id = %state.current.id,
                        status = state.current.status.as_str(),
                        retries_used = state.retries_used,
                        elapsed_ms = elapsed_ms(started),
                        "workflow run completed"
                    );
                    return Ok(state.into_success());
                }
                Observation::Failed if plan.retry_on_failure && state.retries_used < plan.max_retries => {
                    warn!(
                        execution_id = %state.current.id,
                        status = state.current.status.as_str(),
                        retries_used = state.retries_used,
                        max_retries = plan.max_retries,
                        elapsed_ms = elapsed_ms(started),
                        "workflow run failed, retrying with a new run"
                    );
                    pause(deadline, cancel, plan.retry_delay)
                        .await
                        .map_err(|reason| interrupted(reason, plan, started, Some(&state)))?;
                    let next = self.trigger(plan, deadline, cancel, started, Some(&state)).await?;
                    state.record_retry(next);
                }
                Observation::Failed => {
                    warn!(
                        execution_id = %state.current.id,
                        status = state.current.status.as_str(),
                        retries_used = state.retries_used,
                        elapsed_ms = elapsed_ms(started),
                        "workflow run failed"
                    );
                    return Err(state.into_failure(plan));
                }
                Observation::Pending => {
                    pause(deadline, cancel, plan.poll_interval)
                        .await
                        .map_err(|reason| interrupted(reason, plan, started, Some(&state)))?;
                }
            }
        }
    }
}

#[async_trait]
impl ToolHandler for ExecuteWorkflowTool {
    fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    async fn handle(&self, params: Value, ctx: &InvocationContext) -> Result<Value, ToolError> {
        let request: ExecuteWorkflowRequest = parse_params(params)?;
        let plan = request.into_plan(&self.settings)?;
        let cancel = &ctx.cancellation;
        let started = Instant::now();
        let deadline = plan.wait_for_completion.then(|| started + plan.timeout());

        self.ensure_runnable(&plan, deadline, cancel, started).await?;
        let job = self.trigger(&plan, deadline, cancel, started, None).await?;

        let Some(deadline) = deadline else {
            let mut data = execution_fields(&job);
            data.insert("waited".to_string(), Value::Bool(false));
            return Ok(Value::Object(data));
        };
        self.wait_for_completion(&plan, PollState::new(started, deadline, job), cancel)
            .await
    }
}
