//! Step contract and sequential pipeline runner.
//!
//! A pipeline is a strictly ordered sequence of idempotent steps; each step
//! is independently retryable by the enclosing step runtime. Step N's output
//! parameters are step N+1's inputs, so there is no intra-pipeline
//! parallelism. Any step error aborts the remaining pipeline and triggers
//! the failure callback (if one is installed); a successful pipeline
//! performs no callback action.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::params::TaskContext;
use crate::{Error, Result};

/// One idempotent, retryable unit of a pipeline.
#[async_trait]
pub trait Step: Send + Sync {
    /// Stable step name, used in logs and failure reports
    fn name(&self) -> &str;

    /// Execute the step against the shared task context
    async fn execute(&self, ctx: &mut TaskContext) -> Result<()>;
}

/// Invoked by the pipeline when any step fails irrecoverably.
#[async_trait]
pub trait FailureCallback: Send + Sync {
    /// Handle the failure of `failed_step`.
    ///
    /// Implementations append diagnostics to the task message rather than
    /// replacing it, and roll externally visible state (registry entry,
    /// store record) to a failure status.
    async fn on_failure(&self, ctx: &mut TaskContext, failed_step: &str, error: &Error)
        -> Result<()>;
}

/// Outcome of one pipeline run.
#[derive(Debug)]
pub struct PipelineReport {
    /// Names of the steps that completed successfully, in order
    pub completed: Vec<String>,
    /// Name of the step that failed, if any
    pub failed_step: Option<String>,
    /// The error that aborted the pipeline, if any
    pub error: Option<Error>,
}

impl PipelineReport {
    /// Whether every step completed
    pub fn is_success(&self) -> bool {
        self.failed_step.is_none()
    }
}

/// A strictly ordered sequence of steps with an optional failure callback.
pub struct Pipeline {
    name: String,
    steps: Vec<Box<dyn Step>>,
    callback: Option<Arc<dyn FailureCallback>>,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            callback: None,
        }
    }

    /// Append a step
    pub fn step(mut self, step: Box<dyn Step>) -> Self {
        self.steps.push(step);
        self
    }

    /// Install the failure callback
    pub fn on_failure(mut self, callback: Arc<dyn FailureCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    /// The pipeline name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the steps in order, stopping at the first error.
    ///
    /// On failure the callback runs with the failed step's name and error;
    /// a callback error is appended to the task message but does not mask
    /// the original step error.
    pub async fn run(&self, ctx: &mut TaskContext) -> PipelineReport {
        let mut completed = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            info!(pipeline = %self.name, step = %step.name(), task = %ctx.task_id(), "executing step");
            match step.execute(ctx).await {
                Ok(()) => completed.push(step.name().to_string()),
                Err(e) => {
                    error!(
                        pipeline = %self.name,
                        step = %step.name(),
                        task = %ctx.task_id(),
                        error = %e,
                        "step failed, aborting pipeline"
                    );
                    ctx.append_message(&format!("step {} failed: {}", step.name(), e));

                    if let Some(callback) = &self.callback {
                        if let Err(cb_err) = callback.on_failure(ctx, step.name(), &e).await {
                            error!(
                                pipeline = %self.name,
                                error = %cb_err,
                                "failure callback itself failed"
                            );
                            ctx.append_message(&format!("failure callback failed: {}", cb_err));
                        }
                    }

                    return PipelineReport {
                        completed,
                        failed_step: Some(step.name().to_string()),
                        error: Some(e),
                    };
                }
            }
        }

        PipelineReport {
            completed,
            failed_step: None,
            error: None,
        }
    }
}
