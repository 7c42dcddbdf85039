//! Taiji backend: RPC scheduler with billing-module bootstrap.
//!
//! Quota lines are filtered to the objects annotated for Taiji. The
//! backend additionally needs a sub-cluster location (from a per-quota
//! annotation) and a billing business/module ID pair; when the IDs are
//! absent a "create module" call is made once and the result is persisted
//! onto the host namespace's annotations so it is not repeated.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use fedlink_common::{keys, Error, Result};
use fedlink_gateway::HostClusterApi;

use crate::backend::ReconcileBackend;
use crate::classify::SubClusterKind;
use crate::convert::quota_lines_for_backend;
use crate::scheduler::{
    CreateModuleRequest, ModuleInfo, NamespaceQuotaRequest, RegistrationState, SchedulerBackend,
    SchedulerClient,
};
use crate::state::NamespaceState;

/// Reconciles a federated namespace's quota into the Taiji scheduler.
pub struct TaijiBackend {
    scheduler: SchedulerClient,
    host: Arc<dyn HostClusterApi>,
}

impl TaijiBackend {
    /// Create a backend over the given scheduler and cluster API
    pub fn new(scheduler: SchedulerClient, host: Arc<dyn HostClusterApi>) -> Self {
        Self { scheduler, host }
    }

    /// Billing IDs for the namespace, creating the module on first use.
    ///
    /// The returned IDs are persisted to the host namespace so a re-run of
    /// the step (with a fresh state snapshot) skips the create call.
    async fn ensure_module(&self, state: &NamespaceState) -> Result<ModuleInfo> {
        if let (Some(biz), Some(module)) = (
            state.host_annotation(keys::ANNO_TAIJI_BK_BIZ_ID),
            state.host_annotation(keys::ANNO_TAIJI_BK_MODULE_ID),
        ) {
            debug!(namespace = %state.name(), bk_biz_id = %biz, "billing module already bound");
            return Ok(ModuleInfo {
                bk_biz_id: biz.to_string(),
                bk_module_id: module.to_string(),
            });
        }

        let module = self
            .scheduler
            .create_module(&CreateModuleRequest {
                namespace: state.name().to_string(),
                project_code: state.namespace.project_code.clone(),
            })
            .await?;
        info!(
            namespace = %state.name(),
            bk_biz_id = %module.bk_biz_id,
            bk_module_id = %module.bk_module_id,
            "created billing module, persisting to host namespace"
        );

        let annotations: BTreeMap<String, String> = [
            (
                keys::ANNO_TAIJI_BK_BIZ_ID.to_string(),
                module.bk_biz_id.clone(),
            ),
            (
                keys::ANNO_TAIJI_BK_MODULE_ID.to_string(),
                module.bk_module_id.clone(),
            ),
        ]
        .into();
        self.host
            .merge_namespace_annotations(&state.host_cluster_id, state.name(), &annotations)
            .await?;
        Ok(module)
    }
}

#[async_trait]
impl ReconcileBackend for TaijiBackend {
    fn kind(&self) -> SubClusterKind {
        SubClusterKind::Taiji
    }

    async fn exists(&self, state: &NamespaceState, _sub_cluster_id: &str) -> Result<bool> {
        Ok(matches!(
            self.scheduler
                .registration_state(SchedulerBackend::Taiji, state.name())
                .await?,
            RegistrationState::Registered(_)
        ))
    }

    async fn create_or_update(&self, state: &NamespaceState, sub_cluster_id: &str) -> Result<()> {
        let lines = quota_lines_for_backend(&state.quotas, keys::ANNO_QUOTA_TAIJI);
        if lines.is_empty() {
            debug!(namespace = %state.name(), "no quota routed to taiji, nothing to do");
            return Ok(());
        }

        let location = lines
            .iter()
            .find_map(|l| l.location.clone())
            .ok_or_else(|| {
                Error::precondition(format!(
                    "no {} annotation on any taiji quota of namespace {}",
                    keys::ANNO_TAIJI_LOCATION,
                    state.name()
                ))
            })?;

        let module = self.ensure_module(state).await?;
        let request = NamespaceQuotaRequest {
            namespace: state.name().to_string(),
            sub_cluster_id: sub_cluster_id.to_string(),
            location: Some(location),
            bk_biz_id: Some(module.bk_biz_id),
            bk_module_id: Some(module.bk_module_id),
            quotas: lines,
        };

        match self
            .scheduler
            .registration_state(SchedulerBackend::Taiji, state.name())
            .await?
        {
            RegistrationState::NotRegistered => {
                self.scheduler
                    .create_namespace_quota(SchedulerBackend::Taiji, &request)
                    .await
            }
            RegistrationState::Registered(_) => {
                self.scheduler
                    .update_namespace_quota(SchedulerBackend::Taiji, &request)
                    .await
            }
        }
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

    fn taiji_quota() -> fedlink_common::quota::MultiClusterResourceQuota {
        CreateFederationClusterNamespaceQuotaRequest {
            namespace: "workloads".into(),
            quota_name: "gpu-quota".into(),
            hard: [("nvidia.com/gpu".to_string(), "8".to_string())].into(),
            task_selector: BTreeMap::new(),
            annotations: [
                (keys::ANNO_QUOTA_TAIJI.to_string(), "true".to_string()),
                (keys::ANNO_TAIJI_LOCATION.to_string(), "shanghai-2".to_string()),
            ]
            .into(),
        }
        .to_quota()
    }

    fn host_with_namespace(annotations: &BTreeMap<String, String>) -> Arc<InMemoryHostCluster> {
        let cluster = Arc::new(InMemoryHostCluster::default());
        cluster.seed_namespace(
            "cm-host-1",
            Namespace {
                metadata: kube::api::ObjectMeta {
                    name: Some("workloads".to_string()),
                    annotations: Some(annotations.clone()),
                    ..Default::default()
                },
                ..Default::default()
            },
        );
        cluster
    }

    fn state_from_host(cluster: &InMemoryHostCluster) -> NamespaceState {
        let annotations = cluster
            .namespace("cm-host-1", "workloads")
            .unwrap()
            .metadata
            .annotations
            .unwrap_or_default();
        NamespaceState {
            host_cluster_id: "cm-host-1".into(),
            namespace: FederatedNamespace {
                host_cluster_id: "cm-host-1".into(),
                name: "workloads".into(),
                sub_clusters: vec!["CM-SUB-3".into()],
                project_code: "proj-a".into(),
                created_at: None,
            },
            host_annotations: annotations,
            quotas: vec![taiji_quota()],
        }
    }

    /// Story: first run creates the billing module exactly once and
    /// persists the IDs; a second run (fresh snapshot, IDs now present)
    /// skips module creation and routes to update.
    #[tokio::test]
    async fn story_module_is_created_exactly_once() {
        let host = host_with_namespace(
            &[(
                keys::ANNO_IS_FEDERATED_NAMESPACE.to_string(),
                "true".to_string(),
            )]
            .into(),
        );
        let scheduler = Arc::new(InMemoryScheduler::default());
        let backend = TaijiBackend::new(SchedulerClient::new(scheduler.clone()), host.clone());

        let state = state_from_host(&host);
        backend.create_or_update(&state, "CM-SUB-3").await.unwrap();

        assert_eq!(scheduler.module_call_count(), 1);
        assert_eq!(scheduler.create_count(), 1);
        assert_eq!(scheduler.update_count(), 0);

        // The IDs were persisted onto the host namespace
        let annotations = host
            .namespace("cm-host-1", "workloads")
            .unwrap()
            .metadata
            .annotations
            .unwrap();
        assert!(annotations.contains_key(keys::ANNO_TAIJI_BK_BIZ_ID));
        assert!(annotations.contains_key(keys::ANNO_TAIJI_BK_MODULE_ID));

        // Second run with a fresh snapshot
        let state = state_from_host(&host);
        backend.create_or_update(&state, "CM-SUB-3").await.unwrap();

        assert_eq!(scheduler.module_call_count(), 1, "module created only once");
        assert_eq!(scheduler.update_count(), 1, "second run updates");
    }

    #[tokio::test]
    async fn test_missing_location_annotation_is_fatal() {
        let host = host_with_namespace(&BTreeMap::new());
        let scheduler = Arc::new(InMemoryScheduler::default());
        let backend = TaijiBackend::new(SchedulerClient::new(scheduler.clone()), host.clone());

        let mut state = state_from_host(&host);
        // A quota routed to taiji but with no location annotation
        state.quotas = vec![CreateFederationClusterNamespaceQuotaRequest {
            namespace: "workloads".into(),
            quota_name: "gpu-quota".into(),
            hard: [("cpu".to_string(), "4".to_string())].into(),
            task_selector: BTreeMap::new(),
            annotations: [(keys::ANNO_QUOTA_TAIJI.to_string(), "true".to_string())].into(),
        }
        .to_quota()];

        let err = backend
            .create_or_update(&state, "CM-SUB-3")
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains(keys::ANNO_TAIJI_LOCATION));
        assert_eq!(scheduler.module_call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_taiji_quota_is_a_noop() {
        let host = host_with_namespace(&BTreeMap::new());
        let scheduler = Arc::new(InMemoryScheduler::default());
        let backend = TaijiBackend::new(SchedulerClient::new(scheduler.clone()), host.clone());

        let mut state = state_from_host(&host);
        state.quotas = Vec::new();
        backend.create_or_update(&state, "CM-SUB-3").await.unwrap();

        assert_eq!(scheduler.create_count(), 0);
        assert_eq!(scheduler.module_call_count(), 0);
    }
}
