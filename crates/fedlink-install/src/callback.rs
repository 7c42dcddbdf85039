//! Failure callback for the installation pipeline.
//!
//! Rolls the registry entry to CREATE-FAILURE and the store record to
//! CreateFailed. Sub-step failures append to the task's running message
//! rather than replacing it, so the operator sees a cumulative trail. A
//! missing federation-cluster-ID parameter is itself fatal.

use async_trait::async_trait;
use tracing::warn;

use fedlink_common::params::{TaskContext, PARAM_FEDERATION_CLUSTER_ID};
use fedlink_common::step::FailureCallback;
use fedlink_common::types::FederationClusterStatus;
use fedlink_common::{Error, Result};
use fedlink_gateway::RegistryClusterStatus;

use crate::context::InstallContext;

/// Marks the federation cluster as failed after any installation step error.
pub struct InstallFailureCallback {
    ctx: InstallContext,
}

impl InstallFailureCallback {
    /// Create the callback
    pub fn new(ctx: InstallContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl FailureCallback for InstallFailureCallback {
    async fn on_failure(
        &self,
        task: &mut TaskContext,
        failed_step: &str,
        error: &Error,
    ) -> Result<()> {
        let federation_cluster_id = task.common_param(PARAM_FEDERATION_CLUSTER_ID)?.to_string();
        warn!(
            federation_cluster = %federation_cluster_id,
            step = %failed_step,
            error = %error,
            "installation failed, rolling cluster to failure status"
        );

        if let Err(e) = self
            .ctx
            .manager
            .update_cluster_status(&federation_cluster_id, RegistryClusterStatus::CreateFailure)
            .await
        {
            task.append_message(&format!(
                "failed to mark registry entry {} CREATE-FAILURE: {}",
                federation_cluster_id, e
            ));
        }

        if let Err(e) = self
            .ctx
            .store
            .update_status(&federation_cluster_id, FederationClusterStatus::CreateFailed)
            .await
        {
            task.append_message(&format!(
                "failed to mark store record {} CreateFailed: {}",
                federation_cluster_id, e
            ));
        }

        Ok(())
    }
}
