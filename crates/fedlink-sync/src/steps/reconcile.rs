//! Step 3: fan the snapshot out to every sub-cluster in range.
//!
//! Each sub-cluster is classified from its managed-cluster labels and
//! handed to the backend registered for that kind. Remote failures retry
//! with backoff; classification failures do not.

use async_trait::async_trait;
use tracing::info;

use fedlink_backends::{NamespaceState, SubClusterKind};
use fedlink_common::params::{TaskContext, PARAM_NAMESPACE_STATE};
use fedlink_common::retry::retry_if_retryable;
use fedlink_common::step::Step;
use fedlink_common::{Error, Result};

use crate::context::SyncContext;

/// Dispatches each in-range sub-cluster to its quota backend.
pub struct ReconcileBackendsStep {
    ctx: SyncContext,
}

impl ReconcileBackendsStep {
    /// Create the step
    pub fn new(ctx: SyncContext) -> Self {
        Self { ctx }
    }

    async fn classify(&self, state: &NamespaceState, sub_cluster_id: &str) -> Result<SubClusterKind> {
        let managed = self
            .ctx
            .host
            .get_managed_cluster(&state.host_cluster_id, sub_cluster_id)
            .await?
            .ok_or_else(|| {
                Error::precondition(format!(
                    "sub-cluster {} has no managed-cluster object on {}",
                    sub_cluster_id, state.host_cluster_id
                ))
            })?;
        Ok(SubClusterKind::from_labels(
            &managed.metadata.labels.unwrap_or_default(),
        ))
    }
}

#[async_trait]
impl Step for ReconcileBackendsStep {
    fn name(&self) -> &str {
        "reconcile sub-cluster backends"
    }

    async fn execute(&self, task: &mut TaskContext) -> Result<()> {
        let state: NamespaceState = serde_json::from_str(task.common_param(PARAM_NAMESPACE_STATE)?)
            .map_err(|e| Error::serialization_for_kind("NamespaceState", e.to_string()))?;

        // An empty cluster range is a valid, complete sync.
        if state.namespace.sub_clusters.is_empty() {
            info!(namespace = %state.name(), "cluster range is empty, nothing to reconcile");
            return Ok(());
        }

        for sub_cluster_id in &state.namespace.sub_clusters {
            let kind = self.classify(&state, sub_cluster_id).await?;
            let backend = self.ctx.backend_for(kind).ok_or_else(|| {
                Error::internal(format!("no backend registered for {} sub-clusters", kind.as_str()))
            })?;

            info!(
                sub_cluster = %sub_cluster_id,
                kind = %kind.as_str(),
                namespace = %state.name(),
                "reconciling sub-cluster"
            );
            let op_name = format!("reconcile {} on {}", state.name(), sub_cluster_id);
            retry_if_retryable(&self.ctx.retry, &op_name, || {
                backend.create_or_update(&state, sub_cluster_id)
            })
            .await?;
        }
        Ok(())
    }
}
