//! Shared dependencies of the sync steps.

use std::sync::Arc;

use fedlink_backends::{
    hunbu::HunbuBackend, normal::NormalBackend, suanli::SuanliBackend, taiji::TaijiBackend,
    ReconcileBackend, SchedulerClient, SubClusterKind,
};
use fedlink_common::retry::RetryConfig;
use fedlink_gateway::HostClusterApi;

/// Clients and backends every sync step works against.
///
/// Constructed once at process start and passed into the pipeline; there
/// is no global client slot.
#[derive(Clone)]
pub struct SyncContext {
    /// Host/sub-cluster API
    pub host: Arc<dyn HostClusterApi>,
    /// Retry profile for remote-mutation steps
    pub retry: RetryConfig,
    backends: Vec<Arc<dyn ReconcileBackend>>,
}

impl SyncContext {
    /// Create a context with no backends registered
    pub fn new(host: Arc<dyn HostClusterApi>) -> Self {
        Self {
            host,
            retry: RetryConfig::default(),
            backends: Vec::new(),
        }
    }

    /// Create a context with all four standard backends registered
    pub fn with_standard_backends(
        host: Arc<dyn HostClusterApi>,
        scheduler: SchedulerClient,
    ) -> Self {
        Self::new(host.clone())
            .with_backend(Arc::new(NormalBackend::new(host.clone())))
            .with_backend(Arc::new(HunbuBackend::new(host.clone())))
            .with_backend(Arc::new(TaijiBackend::new(scheduler.clone(), host.clone())))
            .with_backend(Arc::new(SuanliBackend::new(scheduler, host)))
    }

    /// Register a backend
    pub fn with_backend(mut self, backend: Arc<dyn ReconcileBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Override the retry profile
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The backend registered for a sub-cluster kind, if any
    pub fn backend_for(&self, kind: SubClusterKind) -> Option<&Arc<dyn ReconcileBackend>> {
        self.backends.iter().find(|b| b.kind() == kind)
    }
}
