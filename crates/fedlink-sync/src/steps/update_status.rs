//! Step 4: stamp the sync result back onto the host namespace.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;

use fedlink_common::keys;
use fedlink_common::params::{TaskContext, PARAM_HOST_CLUSTER_ID, PARAM_NAMESPACE};
use fedlink_common::step::Step;
use fedlink_common::Result;

use crate::context::SyncContext;

/// Records the task ID, success marker, and sync time on the host namespace.
pub struct UpdateNamespaceStatusStep {
    ctx: SyncContext,
}

impl UpdateNamespaceStatusStep {
    /// Create the step
    pub fn new(ctx: SyncContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Step for UpdateNamespaceStatusStep {
    fn name(&self) -> &str {
        "update namespace status"
    }

    async fn execute(&self, task: &mut TaskContext) -> Result<()> {
        let host_cluster_id = task.common_param(PARAM_HOST_CLUSTER_ID)?.to_string();
        let name = task.common_param(PARAM_NAMESPACE)?.to_string();

        let stamp: BTreeMap<String, String> = [
            (keys::ANNO_TASK_ID.to_string(), task.task_id().to_string()),
            (
                keys::ANNO_SYNC_STATUS.to_string(),
                keys::SYNC_STATUS_SUCCESS.to_string(),
            ),
            (
                keys::ANNO_SYNC_UPDATE_TIME.to_string(),
                Utc::now().to_rfc3339(),
            ),
        ]
        .into();

        self.ctx
            .host
            .merge_namespace_annotations(&host_cluster_id, &name, &stamp)
            .await
    }
}
