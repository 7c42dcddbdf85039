//! Task parameter bag shared across the steps of one pipeline instance.
//!
//! The step runtime owns task persistence; this type is the in-process view
//! a step reads and writes. Common parameters are shared by every step of
//! one workflow instance, step parameters are scoped to a single step, and
//! the running message accumulates diagnostics — it is appended to, never
//! replaced, so the operator sees a cumulative trail.

use std::collections::BTreeMap;

use crate::{Error, Result};

// Common parameter names used by the pipelines.

/// Host cluster ID the pipeline operates on
pub const PARAM_HOST_CLUSTER_ID: &str = "host-cluster-id";
/// Federation (proxy) cluster ID assigned by the registry
pub const PARAM_FEDERATION_CLUSTER_ID: &str = "federation-cluster-id";
/// User-facing name of the federation cluster
pub const PARAM_FEDERATION_CLUSTER_NAME: &str = "federation-cluster-name";
/// Project ID owning the federation cluster
pub const PARAM_PROJECT_ID: &str = "project-id";
/// Project code owning the federation cluster
pub const PARAM_PROJECT_CODE: &str = "project-code";
/// User that triggered the installation
pub const PARAM_CREATOR: &str = "creator";
/// Externally reachable address of the unified API server
pub const PARAM_APISERVER_ADDRESS: &str = "federation-apiserver-address";
/// Bootstrap token (`<id>.<secret>`) minted for sub-cluster registration
pub const PARAM_REGISTER_TOKEN: &str = "register-token";
/// JSON-encoded sync request (input to the sync pipeline)
pub const PARAM_SYNC_REQUEST: &str = "request";
/// Namespace the sync pipeline reconciles
pub const PARAM_NAMESPACE: &str = "namespace";
/// JSON-encoded namespace/quota state fetched from the host cluster
pub const PARAM_NAMESPACE_STATE: &str = "namespace-state";

/// In-process view of one task's parameters and running message.
#[derive(Clone, Debug, Default)]
pub struct TaskContext {
    task_id: String,
    common: BTreeMap<String, String>,
    step: BTreeMap<String, String>,
    message: String,
}

impl TaskContext {
    /// Create a context for the given task ID
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            ..Default::default()
        }
    }

    /// Seed a common parameter (builder style, used by pipeline triggers)
    pub fn with_common_param(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.common.insert(name.into(), value.into());
        self
    }

    /// The task ID driving this pipeline instance
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Read a required common parameter.
    ///
    /// A missing required parameter is a fatal, non-retryable error.
    pub fn common_param(&self, name: &str) -> Result<&str> {
        self.common
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::missing_parameter(name))
    }

    /// Read an optional common parameter
    pub fn common_param_opt(&self, name: &str) -> Option<&str> {
        self.common.get(name).map(String::as_str)
    }

    /// Write a common parameter for downstream steps
    pub fn set_common_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.common.insert(name.into(), value.into());
    }

    /// Read a required step-local parameter
    pub fn step_param(&self, name: &str) -> Result<&str> {
        self.step
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::missing_parameter(name))
    }

    /// Write a step-local parameter
    pub fn set_step_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.step.insert(name.into(), value.into());
    }

    /// Append diagnostic text to the task's running message.
    ///
    /// Existing text is preserved so repeated failures build a trail.
    pub fn append_message(&mut self, text: &str) {
        if self.message.is_empty() {
            self.message.push_str(text);
        } else {
            self.message.push_str("; ");
            self.message.push_str(text);
        }
    }

    /// The cumulative running message
    pub fn message(&self) -> &str {
        &self.message
    }
}
