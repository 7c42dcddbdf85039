//! In-memory component installer. Used by tests and local dry-runs.

use async_trait::async_trait;
use dashmap::DashSet;

use fedlink_common::{Error, Result};

use crate::component::{ComponentInstaller, FederationComponent};

/// Installer that records installations in a process-local set.
#[derive(Default)]
pub struct InMemoryInstaller {
    installed: DashSet<(String, FederationComponent)>,
    failing: DashSet<FederationComponent>,
}

impl InMemoryInstaller {
    /// Pre-mark a component as installed (double-install scenarios)
    pub fn mark_installed(&self, cluster_id: &str, component: FederationComponent) {
        self.installed.insert((cluster_id.to_string(), component));
    }

    /// Make installs of `component` fail
    pub fn fail_installs_of(&self, component: FederationComponent) {
        self.failing.insert(component);
    }
}

#[async_trait]
impl ComponentInstaller for InMemoryInstaller {
    async fn is_installed(
        &self,
        cluster_id: &str,
        component: FederationComponent,
    ) -> Result<bool> {
        Ok(self
            .installed
            .contains(&(cluster_id.to_string(), component)))
    }

    async fn install(&self, cluster_id: &str, component: FederationComponent) -> Result<()> {
        if self.failing.contains(&component) {
            return Err(Error::internal_with_context(
                "install",
                format!("chart installation of {} failed", component),
            ));
        }
        self.installed.insert((cluster_id.to_string(), component));
        Ok(())
    }
}
