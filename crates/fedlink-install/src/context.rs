//! Shared dependencies of the installation steps.

use std::sync::Arc;

use fedlink_common::retry::RetryConfig;
use fedlink_gateway::{ClusterManagerClient, HostClusterApi};

use crate::component::ComponentInstaller;
use crate::store::FederationClusterStore;

/// Clients and stores every installation step works against.
///
/// Constructed once at process start and passed into the pipeline; there
/// is no global client slot.
#[derive(Clone)]
pub struct InstallContext {
    /// Central cluster registry client
    pub manager: ClusterManagerClient,
    /// Host/sub-cluster API
    pub host: Arc<dyn HostClusterApi>,
    /// Federation cluster record store
    pub store: Arc<dyn FederationClusterStore>,
    /// Component installer
    pub installer: Arc<dyn ComponentInstaller>,
    /// Retry profile for the unified API server polling loops
    pub retry: RetryConfig,
}

impl InstallContext {
    /// Assemble an installation context with the default retry profile
    pub fn new(
        manager: ClusterManagerClient,
        host: Arc<dyn HostClusterApi>,
        store: Arc<dyn FederationClusterStore>,
        installer: Arc<dyn ComponentInstaller>,
    ) -> Self {
        Self {
            manager,
            host,
            store,
            installer,
            retry: RetryConfig::default(),
        }
    }

    /// Override the polling retry profile
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}
