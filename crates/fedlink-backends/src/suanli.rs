//! Suanli backend: RPC scheduler, no billing module.
//!
//! Same probe discipline as Taiji; after a successful create or update the
//! installed-platform annotation is stamped on the host namespace.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use fedlink_common::{keys, Result};
use fedlink_gateway::HostClusterApi;

use crate::backend::ReconcileBackend;
use crate::classify::SubClusterKind;
use crate::convert::quota_lines_for_backend;
use crate::scheduler::{NamespaceQuotaRequest, RegistrationState, SchedulerBackend, SchedulerClient};
use crate::state::NamespaceState;

/// Default platform name stamped on namespaces Suanli quota is installed for
pub const DEFAULT_PLATFORM: &str = "suanli";

/// Reconciles a federated namespace's quota into the Suanli scheduler.
pub struct SuanliBackend {
    scheduler: SchedulerClient,
    host: Arc<dyn HostClusterApi>,
    platform: String,
}

impl SuanliBackend {
    /// Create a backend over the given scheduler and cluster API
    pub fn new(scheduler: SchedulerClient, host: Arc<dyn HostClusterApi>) -> Self {
        Self {
            scheduler,
            host,
            platform: DEFAULT_PLATFORM.to_string(),
        }
    }

    /// Override the platform name stamped on the host namespace
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }
}

#[async_trait]
impl ReconcileBackend for SuanliBackend {
    fn kind(&self) -> SubClusterKind {
        SubClusterKind::Suanli
    }

    async fn exists(&self, state: &NamespaceState, _sub_cluster_id: &str) -> Result<bool> {
        Ok(matches!(
            self.scheduler
                .registration_state(SchedulerBackend::Suanli, state.name())
                .await?,
            RegistrationState::Registered(_)
        ))
    }

    async fn create_or_update(&self, state: &NamespaceState, sub_cluster_id: &str) -> Result<()> {
        let lines = quota_lines_for_backend(&state.quotas, keys::ANNO_QUOTA_SUANLI);
        if lines.is_empty() {
            debug!(namespace = %state.name(), "no quota routed to suanli, nothing to do");
            return Ok(());
        }

        let request = NamespaceQuotaRequest {
            namespace: state.name().to_string(),
            sub_cluster_id: sub_cluster_id.to_string(),
            location: None,
            bk_biz_id: None,
            bk_module_id: None,
            quotas: lines,
        };

        match self
            .scheduler
            .registration_state(SchedulerBackend::Suanli, state.name())
            .await?
        {
            RegistrationState::NotRegistered => {
                self.scheduler
                    .create_namespace_quota(SchedulerBackend::Suanli, &request)
                    .await?
            }
            RegistrationState::Registered(_) => {
                self.scheduler
                    .update_namespace_quota(SchedulerBackend::Suanli, &request)
                    .await?
            }
        }

        let annotations: BTreeMap<String, String> = [(
            keys::ANNO_SUANLI_PLATFORM.to_string(),
            self.platform.clone(),
        )]
        .into();
        self.host
            .merge_namespace_annotations(&state.host_cluster_id, state.name(), &annotations)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedlink_common::quota::CreateFederationClusterNamespaceQuotaRequest;
    use fedlink_common::types::FederatedNamespace;
    use fedlink_gateway::memory::InMemoryHostCluster;
    use k8s_openapi::api::core::v1::Namespace;

    use crate::memory::InMemoryScheduler;

    fn setup() -> (Arc<InMemoryScheduler>, Arc<InMemoryHostCluster>, SuanliBackend) {
        let host = Arc::new(InMemoryHostCluster::default());
        host.seed_namespace(
            "cm-host-1",
            Namespace {
                metadata: kube::api::ObjectMeta {
                    name: Some("workloads".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        let scheduler = Arc::new(InMemoryScheduler::default());
        let backend = SuanliBackend::new(SchedulerClient::new(scheduler.clone()), host.clone());
        (scheduler, host, backend)
    }

    fn state() -> NamespaceState {
        NamespaceState {
            host_cluster_id: "cm-host-1".into(),
            namespace: FederatedNamespace {
                host_cluster_id: "cm-host-1".into(),
                name: "workloads".into(),
                sub_clusters: vec!["CM-SUB-4".into()],
                project_code: "proj-a".into(),
                created_at: None,
            },
            host_annotations: BTreeMap::new(),
            quotas: vec![CreateFederationClusterNamespaceQuotaRequest {
                namespace: "workloads".into(),
                quota_name: "cpu-quota".into(),
                hard: [("cpu".to_string(), "64".to_string())].into(),
                task_selector: BTreeMap::new(),
                annotations: [(keys::ANNO_QUOTA_SUANLI.to_string(), "true".to_string())].into(),
            }
            .to_quota()],
        }
    }

    /// First run registers, second run updates; the installed-platform
    /// annotation is stamped on the host namespace either way.
    #[tokio::test]
    async fn test_create_then_update_and_platform_stamp() {
        let (scheduler, host, backend) = setup();
        let state = state();

        backend.create_or_update(&state, "CM-SUB-4").await.unwrap();
        assert_eq!(scheduler.create_count(), 1);

        backend.create_or_update(&state, "CM-SUB-4").await.unwrap();
        assert_eq!(scheduler.create_count(), 1);
        assert_eq!(scheduler.update_count(), 1);

        let annotations = host
            .namespace("cm-host-1", "workloads")
            .unwrap()
            .metadata
            .annotations
            .unwrap();
        assert_eq!(
            annotations.get(keys::ANNO_SUANLI_PLATFORM).map(String::as_str),
            Some(DEFAULT_PLATFORM)
        );
    }

    #[tokio::test]
    async fn test_no_suanli_quota_is_a_noop() {
        let (scheduler, host, backend) = setup();
        let mut state = state();
        state.quotas = Vec::new();

        backend.create_or_update(&state, "CM-SUB-4").await.unwrap();
        assert_eq!(scheduler.create_count(), 0);
        // No platform stamp without an actual install
        let annotations = host
            .namespace("cm-host-1", "workloads")
            .unwrap()
            .metadata
            .annotations;
        assert!(annotations.is_none());
    }
}
