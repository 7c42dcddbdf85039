//! Normal backend: plain Kubernetes namespace sync.
//!
//! The host namespace's annotations are copied verbatim onto the
//! sub-cluster namespace; on update they are merged so annotations set by
//! other owners on the sub-cluster survive.

use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use tracing::info;

use fedlink_common::Result;
use fedlink_gateway::HostClusterApi;

use crate::backend::ReconcileBackend;
use crate::classify::SubClusterKind;
use crate::state::NamespaceState;

/// Reconciles a federated namespace onto an ordinary sub-cluster.
pub struct NormalBackend {
    host: Arc<dyn HostClusterApi>,
}

impl NormalBackend {
    /// Create a backend over the given cluster API
    pub fn new(host: Arc<dyn HostClusterApi>) -> Self {
        Self { host }
    }
}

#[async_trait]
impl ReconcileBackend for NormalBackend {
    fn kind(&self) -> SubClusterKind {
        SubClusterKind::Normal
    }

    async fn exists(&self, state: &NamespaceState, sub_cluster_id: &str) -> Result<bool> {
        Ok(self
            .host
            .get_namespace(sub_cluster_id, state.name())
            .await?
            .is_some())
    }

    async fn create_or_update(&self, state: &NamespaceState, sub_cluster_id: &str) -> Result<()> {
        match self.host.get_namespace(sub_cluster_id, state.name()).await? {
            None => {
                info!(
                    sub_cluster = %sub_cluster_id,
                    namespace = %state.name(),
                    "creating namespace on sub-cluster"
                );
                let namespace = Namespace {
                    metadata: kube::api::ObjectMeta {
                        name: Some(state.name().to_string()),
                        annotations: if state.host_annotations.is_empty() {
                            None
                        } else {
                            Some(state.host_annotations.clone())
                        },
                        ..Default::default()
                    },
                    ..Default::default()
                };
                self.host.create_namespace(sub_cluster_id, &namespace).await
            }
            Some(_) => {
                self.host
                    .merge_namespace_annotations(sub_cluster_id, state.name(), &state.host_annotations)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedlink_common::keys;
    use fedlink_common::types::FederatedNamespace;
    use fedlink_gateway::memory::InMemoryHostCluster;

    fn state() -> NamespaceState {
        NamespaceState {
            host_cluster_id: "cm-host-1".into(),
            namespace: FederatedNamespace {
                host_cluster_id: "cm-host-1".into(),
                name: "workloads".into(),
                sub_clusters: vec!["CM-SUB-1".into()],
                project_code: "proj-a".into(),
                created_at: None,
            },
            host_annotations: [
                (
                    keys::ANNO_IS_FEDERATED_NAMESPACE.to_string(),
                    "true".to_string(),
                ),
                (keys::ANNO_PROJECT_CODE.to_string(), "proj-a".to_string()),
            ]
            .into(),
            quotas: Vec::new(),
        }
    }

    /// Story: running the step twice leaves the same annotation set as
    /// running it once. First call creates, second updates-to-identical.
    #[tokio::test]
    async fn story_reconcile_twice_is_idempotent() {
        let cluster = Arc::new(InMemoryHostCluster::default());
        let backend = NormalBackend::new(cluster.clone());
        let state = state();

        assert!(!backend.exists(&state, "CM-SUB-1").await.unwrap());
        backend.create_or_update(&state, "CM-SUB-1").await.unwrap();
        assert!(backend.exists(&state, "CM-SUB-1").await.unwrap());

        let after_first = cluster
            .namespace("CM-SUB-1", "workloads")
            .unwrap()
            .metadata
            .annotations;

        backend.create_or_update(&state, "CM-SUB-1").await.unwrap();
        let after_second = cluster
            .namespace("CM-SUB-1", "workloads")
            .unwrap()
            .metadata
            .annotations;

        assert_eq!(after_first, after_second);
        assert_eq!(
            after_second
                .unwrap()
                .get(keys::ANNO_PROJECT_CODE)
                .map(String::as_str),
            Some("proj-a")
        );
    }

    /// Annotations set by other owners on the sub-cluster survive an update.
    #[tokio::test]
    async fn test_update_merges_instead_of_replacing() {
        let cluster = Arc::new(InMemoryHostCluster::default());
        let backend = NormalBackend::new(cluster.clone());
        let state = state();

        backend.create_or_update(&state, "CM-SUB-1").await.unwrap();
        cluster
            .merge_namespace_annotations(
                "CM-SUB-1",
                "workloads",
                &[("other-owner".to_string(), "keep".to_string())].into(),
            )
            .await
            .unwrap();

        backend.create_or_update(&state, "CM-SUB-1").await.unwrap();

        let annotations = cluster
            .namespace("CM-SUB-1", "workloads")
            .unwrap()
            .metadata
            .annotations
            .unwrap();
        assert_eq!(annotations.get("other-owner").map(String::as_str), Some("keep"));
        assert_eq!(
            annotations
                .get(keys::ANNO_IS_FEDERATED_NAMESPACE)
                .map(String::as_str),
            Some("true")
        );
    }
}
