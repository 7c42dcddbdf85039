//! Step 6: register the federation cluster as Running.
//!
//! Success handling lives in the last pipeline step rather than a
//! success callback, so the side effects run exactly once.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::info;

use fedlink_common::params::{
    TaskContext, PARAM_APISERVER_ADDRESS, PARAM_FEDERATION_CLUSTER_ID,
    PARAM_FEDERATION_CLUSTER_NAME, PARAM_HOST_CLUSTER_ID, PARAM_REGISTER_TOKEN,
};
use fedlink_common::step::Step;
use fedlink_common::types::FederationClusterStatus;
use fedlink_common::{keys, Error, Result};
use fedlink_gateway::RegistryClusterStatus;

use crate::context::InstallContext;

/// Stores the kubeconfig, flips registry and store to Running, and labels
/// the host cluster.
pub struct RegisterClusterStep {
    ctx: InstallContext,
}

impl RegisterClusterStep {
    /// Create the step
    pub fn new(ctx: InstallContext) -> Self {
        Self { ctx }
    }
}

/// Minimal kubeconfig pointing at the unified API server.
fn federation_kubeconfig(name: &str, address: &str, token: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Config",
        "current-context": name,
        "clusters": [{
            "name": name,
            "cluster": { "server": address, "insecure-skip-tls-verify": true },
        }],
        "users": [{ "name": name, "user": { "token": token } }],
        "contexts": [{
            "name": name,
            "context": { "cluster": name, "user": name },
        }],
    })
    .to_string()
}

#[async_trait]
impl Step for RegisterClusterStep {
    fn name(&self) -> &str {
        "register cluster"
    }

    async fn execute(&self, task: &mut TaskContext) -> Result<()> {
        let federation_cluster_id = task.common_param(PARAM_FEDERATION_CLUSTER_ID)?.to_string();
        let host_cluster_id = task.common_param(PARAM_HOST_CLUSTER_ID)?.to_string();
        let name = task.common_param(PARAM_FEDERATION_CLUSTER_NAME)?.to_string();
        let address = task.common_param(PARAM_APISERVER_ADDRESS)?.to_string();
        let token = task
            .common_param_opt(PARAM_REGISTER_TOKEN)
            .unwrap_or_default()
            .to_string();

        // Re-verify before declaring the cluster Running
        if !self.ctx.host.check_api_address(&address).await? {
            return Err(Error::transport(
                address,
                "unified apiserver stopped serving before registration",
            ));
        }

        let kubeconfig = federation_kubeconfig(&name, &address, &token);
        self.ctx
            .manager
            .update_cluster_kubeconfig(&federation_cluster_id, &kubeconfig)
            .await?;
        self.ctx
            .manager
            .update_cluster_status(&federation_cluster_id, RegistryClusterStatus::Running)
            .await?;

        let mut record = self
            .ctx
            .store
            .get(&federation_cluster_id)
            .await?
            .ok_or_else(|| Error::store(federation_cluster_id.clone(), "record not found"))?;
        record.status = FederationClusterStatus::Running;
        self.ctx.store.update(&record).await?;

        let labels: BTreeMap<String, String> = [(
            keys::LABEL_IS_HOST_CLUSTER.to_string(),
            keys::VALUE_TRUE.to_string(),
        )]
        .into();
        self.ctx
            .manager
            .add_cluster_labels(&host_cluster_id, &labels)
            .await?;

        info!(
            federation_cluster = %federation_cluster_id,
            host_cluster = %host_cluster_id,
            "federation cluster registered and running"
        );
        Ok(())
    }
}
