//! Step 1: pre-register the federation cluster.
//!
//! Creates a placeholder entry in the central registry (status
//! Initialization) and the matching store record (status Creating),
//! injecting the federation-identity and task-ID labels. The registry
//! assigns the federation cluster ID, which every later step reads from
//! the parameter bag.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::info;

use fedlink_common::params::{
    TaskContext, PARAM_CREATOR, PARAM_FEDERATION_CLUSTER_ID, PARAM_FEDERATION_CLUSTER_NAME,
    PARAM_HOST_CLUSTER_ID, PARAM_PROJECT_CODE, PARAM_PROJECT_ID,
};
use fedlink_common::step::Step;
use fedlink_common::types::{FederationCluster, FederationClusterStatus};
use fedlink_common::{keys, Result};
use fedlink_gateway::{CreateClusterRequest, RegistryClusterStatus};

use crate::context::InstallContext;

/// Creates the registry entry and the federation cluster record.
pub struct PreRegisterClusterStep {
    ctx: InstallContext,
}

impl PreRegisterClusterStep {
    /// Create the step
    pub fn new(ctx: InstallContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Step for PreRegisterClusterStep {
    fn name(&self) -> &str {
        "pre-register cluster"
    }

    async fn execute(&self, task: &mut TaskContext) -> Result<()> {
        // A retried step must not register twice
        if let Some(existing) = task.common_param_opt(PARAM_FEDERATION_CLUSTER_ID) {
            info!(federation_cluster = %existing, "already pre-registered, skipping");
            return Ok(());
        }

        let host_cluster_id = task.common_param(PARAM_HOST_CLUSTER_ID)?.to_string();
        let name = task.common_param(PARAM_FEDERATION_CLUSTER_NAME)?.to_string();
        let project_id = task.common_param(PARAM_PROJECT_ID)?.to_string();
        let project_code = task.common_param(PARAM_PROJECT_CODE)?.to_string();
        let creator = task.common_param(PARAM_CREATOR)?.to_string();

        let labels: BTreeMap<String, String> = [
            (
                keys::LABEL_IS_FED_CLUSTER.to_string(),
                keys::VALUE_TRUE.to_string(),
            ),
            (keys::LABEL_TASK_ID.to_string(), task.task_id().to_string()),
        ]
        .into();

        let entry = self
            .ctx
            .manager
            .create_cluster(&CreateClusterRequest {
                cluster_name: name.clone(),
                project_id: project_id.clone(),
                creator: creator.clone(),
                description: format!("federation control plane on {}", host_cluster_id),
                status: RegistryClusterStatus::Initialization,
                labels,
            })
            .await?;
        info!(
            federation_cluster = %entry.cluster_id,
            host_cluster = %host_cluster_id,
            "pre-registered federation cluster"
        );

        let record = FederationCluster {
            host_cluster_id,
            federation_cluster_id: entry.cluster_id.clone(),
            federation_cluster_name: name,
            project_id,
            project_code,
            creator,
            extras: [(keys::LABEL_TASK_ID.to_string(), task.task_id().to_string())].into(),
            description: entry.description.clone(),
            is_deleted: false,
            status: FederationClusterStatus::Creating,
        };
        self.ctx.store.create(&record).await?;

        task.set_common_param(PARAM_FEDERATION_CLUSTER_ID, entry.cluster_id);
        Ok(())
    }
}
