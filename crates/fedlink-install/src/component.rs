//! Federation control-plane components and the installer seam.
//!
//! Chart/manifest installation itself is supplied by the embedding binary
//! through [`ComponentInstaller`]; the pipeline only decides what to
//! install, where, and whether it is already present.

use async_trait::async_trait;

use fedlink_common::Result;

/// The components the installation pipeline provisions on a host cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FederationComponent {
    /// clusternet-hub: registration hub for sub-clusters
    ClusternetHub,
    /// clusternet-controller: lifecycle controller
    ClusternetController,
    /// clusternet-scheduler: cross-cluster scheduler
    ClusternetScheduler,
    /// Unified API server: the externally reachable federation endpoint
    UnifiedApiserver,
}

impl FederationComponent {
    /// Every component, in installation order
    pub const ALL: [FederationComponent; 4] = [
        Self::ClusternetHub,
        Self::ClusternetController,
        Self::ClusternetScheduler,
        Self::UnifiedApiserver,
    ];

    /// Component name used in logs and step names
    pub fn name(&self) -> &'static str {
        match self {
            Self::ClusternetHub => "clusternet-hub",
            Self::ClusternetController => "clusternet-controller",
            Self::ClusternetScheduler => "clusternet-scheduler",
            Self::UnifiedApiserver => "unified-apiserver",
        }
    }

    /// Namespace the component installs into
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::ClusternetHub | Self::ClusternetController | Self::ClusternetScheduler => {
                "clusternet-system"
            }
            Self::UnifiedApiserver => "federation-system",
        }
    }

    /// Load-balanced service exposing the component, if it has one
    pub fn service_name(&self) -> Option<&'static str> {
        match self {
            Self::UnifiedApiserver => Some("federation-apiserver"),
            _ => None,
        }
    }
}

impl std::fmt::Display for FederationComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Installs federation components onto a cluster.
#[async_trait]
pub trait ComponentInstaller: Send + Sync {
    /// Whether the component is already installed on the cluster
    async fn is_installed(
        &self,
        cluster_id: &str,
        component: FederationComponent,
    ) -> Result<bool>;

    /// Install the component. Callers skip this when already installed.
    async fn install(&self, cluster_id: &str, component: FederationComponent) -> Result<()>;
}
