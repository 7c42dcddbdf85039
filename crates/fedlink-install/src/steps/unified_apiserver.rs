//! Step 5: install the unified API server and wait until it serves.
//!
//! After the install, the step polls for the service's load-balancer IP
//! and then for the resulting address actually answering Kubernetes API
//! requests, both under the bounded backoff profile. The confirmed
//! address is published to the parameter bag for the register step.

use async_trait::async_trait;
use tracing::info;

use fedlink_common::params::{TaskContext, PARAM_APISERVER_ADDRESS, PARAM_HOST_CLUSTER_ID};
use fedlink_common::retry::retry_if_retryable;
use fedlink_common::step::Step;
use fedlink_common::{Error, Result};

use crate::component::FederationComponent;
use crate::context::InstallContext;

/// Installs the unified API server and resolves its external address.
pub struct InstallUnifiedApiserverStep {
    ctx: InstallContext,
}

impl InstallUnifiedApiserverStep {
    /// Create the step
    pub fn new(ctx: InstallContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Step for InstallUnifiedApiserverStep {
    fn name(&self) -> &str {
        "install unified apiserver"
    }

    async fn execute(&self, task: &mut TaskContext) -> Result<()> {
        let host_cluster_id = task.common_param(PARAM_HOST_CLUSTER_ID)?.to_string();
        let component = FederationComponent::UnifiedApiserver;
        // The only component with a load-balanced service
        let service = match component.service_name() {
            Some(s) => s,
            None => {
                return Err(Error::internal_with_context(
                    "install",
                    "unified apiserver has no service name",
                ))
            }
        };

        self.ctx
            .host
            .ensure_namespace(&host_cluster_id, component.namespace())
            .await?;
        if !self
            .ctx
            .installer
            .is_installed(&host_cluster_id, component)
            .await?
        {
            self.ctx.installer.install(&host_cluster_id, component).await?;
        }

        let host = self.ctx.host.clone();
        let cluster = host_cluster_id.clone();
        let ip = retry_if_retryable(&self.ctx.retry, "unified apiserver address", || {
            let host = host.clone();
            let cluster = cluster.clone();
            async move {
                host.get_service_loadbalancer_ip(&cluster, component.namespace(), service)
                    .await?
                    .ok_or_else(|| {
                        Error::transport(
                            cluster.clone(),
                            "unified apiserver has no load-balancer address yet",
                        )
                    })
            }
        })
        .await?;

        let address = format!("https://{}:443", ip);
        let host = self.ctx.host.clone();
        let probe_address = address.clone();
        retry_if_retryable(&self.ctx.retry, "unified apiserver health", || {
            let host = host.clone();
            let address = probe_address.clone();
            async move {
                if host.check_api_address(&address).await? {
                    Ok(())
                } else {
                    Err(Error::transport(
                        address.clone(),
                        "unified apiserver address not serving yet",
                    ))
                }
            }
        })
        .await?;

        info!(host_cluster = %host_cluster_id, address = %address, "unified apiserver reachable");
        task.set_common_param(PARAM_APISERVER_ADDRESS, address);
        Ok(())
    }
}
