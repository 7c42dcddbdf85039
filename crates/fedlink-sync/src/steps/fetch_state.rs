//! Step 2: snapshot the namespace and its quotas from the host cluster.
//!
//! The snapshot is serialized into the parameter bag so the
//! backend-specific steps do not each re-query the host cluster.

use async_trait::async_trait;
use tracing::info;

use fedlink_backends::NamespaceState;
use fedlink_common::params::{
    TaskContext, PARAM_HOST_CLUSTER_ID, PARAM_NAMESPACE, PARAM_NAMESPACE_STATE,
};
use fedlink_common::step::Step;
use fedlink_common::types::FederatedNamespace;
use fedlink_common::{Error, Result};

use crate::context::SyncContext;

/// Builds the [`NamespaceState`] snapshot for the downstream steps.
pub struct GetNamespaceAndQuotaStep {
    ctx: SyncContext,
}

impl GetNamespaceAndQuotaStep {
    /// Create the step
    pub fn new(ctx: SyncContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Step for GetNamespaceAndQuotaStep {
    fn name(&self) -> &str {
        "get namespace and quota"
    }

    async fn execute(&self, task: &mut TaskContext) -> Result<()> {
        let host_cluster_id = task.common_param(PARAM_HOST_CLUSTER_ID)?.to_string();
        let name = task.common_param(PARAM_NAMESPACE)?.to_string();

        let ns = self
            .ctx
            .host
            .get_namespace(&host_cluster_id, &name)
            .await?
            .ok_or_else(|| {
                Error::precondition(format!(
                    "namespace {} does not exist on {}",
                    name, host_cluster_id
                ))
            })?;

        let federated = FederatedNamespace::from_namespace(&host_cluster_id, &ns).ok_or_else(
            || {
                Error::precondition(format!(
                    "namespace {} on {} is not annotated as federated",
                    name, host_cluster_id
                ))
            },
        )?;

        let quotas = self.ctx.host.list_quotas(&host_cluster_id, &name).await?;
        info!(
            host_cluster = %host_cluster_id,
            namespace = %name,
            sub_clusters = federated.sub_clusters.len(),
            quotas = quotas.len(),
            "fetched namespace state"
        );

        let state = NamespaceState {
            host_cluster_id,
            namespace: federated,
            host_annotations: ns.metadata.annotations.unwrap_or_default(),
            quotas,
        };
        let encoded = serde_json::to_string(&state)
            .map_err(|e| Error::serialization_for_kind("NamespaceState", e.to_string()))?;
        task.set_common_param(PARAM_NAMESPACE_STATE, encoded);
        Ok(())
    }
}
