//! Step 4: install one clusternet component.
//!
//! Namespace creation is idempotent (already-exists is not an error) and
//! the install itself is skipped when the component is already present,
//! so the step survives re-runs.

use async_trait::async_trait;
use tracing::info;

use fedlink_common::params::{TaskContext, PARAM_HOST_CLUSTER_ID};
use fedlink_common::step::Step;
use fedlink_common::Result;

use crate::component::FederationComponent;
use crate::context::InstallContext;

/// Ensures the component namespace and triggers the component install.
pub struct InstallComponentStep {
    ctx: InstallContext,
    component: FederationComponent,
    step_name: String,
}

impl InstallComponentStep {
    /// Create the step for one component
    pub fn new(ctx: InstallContext, component: FederationComponent) -> Self {
        Self {
            ctx,
            component,
            step_name: format!("install {}", component.name()),
        }
    }
}

#[async_trait]
impl Step for InstallComponentStep {
    fn name(&self) -> &str {
        &self.step_name
    }

    async fn execute(&self, task: &mut TaskContext) -> Result<()> {
        let host_cluster_id = task.common_param(PARAM_HOST_CLUSTER_ID)?.to_string();

        self.ctx
            .host
            .ensure_namespace(&host_cluster_id, self.component.namespace())
            .await?;

        if self
            .ctx
            .installer
            .is_installed(&host_cluster_id, self.component)
            .await?
        {
            info!(
                host_cluster = %host_cluster_id,
                component = %self.component,
                "component already installed, skipping"
            );
            return Ok(());
        }
        self.ctx
            .installer
            .install(&host_cluster_id, self.component)
            .await
    }
}
