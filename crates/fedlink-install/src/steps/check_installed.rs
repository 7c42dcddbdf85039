//! Step 3: double-installation guard.
//!
//! Installation must not proceed over an existing federation control
//! plane; a present component fails the step fast, without retries.

use async_trait::async_trait;

use fedlink_common::params::{TaskContext, PARAM_HOST_CLUSTER_ID};
use fedlink_common::step::Step;
use fedlink_common::{Error, Result};

use crate::component::FederationComponent;
use crate::context::InstallContext;

/// Fails when any federation component is already installed on the host.
pub struct CheckFederationInstalledStep {
    ctx: InstallContext,
}

impl CheckFederationInstalledStep {
    /// Create the step
    pub fn new(ctx: InstallContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Step for CheckFederationInstalledStep {
    fn name(&self) -> &str {
        "check federation installed"
    }

    async fn execute(&self, task: &mut TaskContext) -> Result<()> {
        let host_cluster_id = task.common_param(PARAM_HOST_CLUSTER_ID)?.to_string();

        for component in FederationComponent::ALL {
            if self
                .ctx
                .installer
                .is_installed(&host_cluster_id, component)
                .await?
            {
                return Err(Error::precondition(format!(
                    "federation component {} already installed on {}",
                    component, host_cluster_id
                )));
            }
        }
        Ok(())
    }
}
