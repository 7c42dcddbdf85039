//! Hunbu backend: annotation-driven mixer-cluster reconciliation.
//!
//! Hunbu has no RPC API. Its state lives entirely in namespace
//! annotations on the sub-cluster, and the annotation set is derived from
//! the sub-cluster's managed-cluster labels (mixer membership, network
//! mode, preemption policy/class/value) rather than copied wholesale from
//! the host namespace.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use fedlink_common::{keys, Error, Result};
use fedlink_gateway::HostClusterApi;

use crate::backend::ReconcileBackend;
use crate::classify::SubClusterKind;
use crate::state::NamespaceState;

/// Managed-cluster label keys and the sub-cluster annotation each derives.
const DERIVED_KEYS: [(&str, &str); 5] = [
    (keys::LABEL_HUNBU_MIXER_CLUSTER, keys::ANNO_HUNBU_MIXER_CLUSTER),
    (keys::LABEL_HUNBU_NETWORK_MODE, keys::ANNO_HUNBU_NETWORK_MODE),
    (
        keys::LABEL_HUNBU_PREEMPTION_POLICY,
        keys::ANNO_HUNBU_PREEMPTION_POLICY,
    ),
    (
        keys::LABEL_HUNBU_PREEMPTION_CLASS,
        keys::ANNO_HUNBU_PREEMPTION_CLASS,
    ),
    (
        keys::LABEL_HUNBU_PREEMPTION_VALUE,
        keys::ANNO_HUNBU_PREEMPTION_VALUE,
    ),
];

/// Reconciles a federated namespace onto a Hunbu mixer sub-cluster.
pub struct HunbuBackend {
    host: Arc<dyn HostClusterApi>,
}

impl HunbuBackend {
    /// Create a backend over the given cluster API
    pub fn new(host: Arc<dyn HostClusterApi>) -> Self {
        Self { host }
    }
}

/// Build the restricted annotation set from managed-cluster labels.
fn derive_annotations(labels: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    DERIVED_KEYS
        .iter()
        .filter_map(|(label, annotation)| {
            labels
                .get(*label)
                .map(|v| (annotation.to_string(), v.clone()))
        })
        .collect()
}

#[async_trait]
impl ReconcileBackend for HunbuBackend {
    fn kind(&self) -> SubClusterKind {
        SubClusterKind::Hunbu
    }

    async fn exists(&self, state: &NamespaceState, sub_cluster_id: &str) -> Result<bool> {
        Ok(self
            .host
            .get_namespace(sub_cluster_id, state.name())
            .await?
            .is_some())
    }

    async fn create_or_update(&self, state: &NamespaceState, sub_cluster_id: &str) -> Result<()> {
        let managed = self
            .host
            .get_managed_cluster(&state.host_cluster_id, sub_cluster_id)
            .await?
            .ok_or_else(|| {
                Error::precondition(format!(
                    "sub-cluster {} has no managed-cluster object on {}",
                    sub_cluster_id, state.host_cluster_id
                ))
            })?;

        let labels = managed.metadata.labels.unwrap_or_default();
        let annotations = derive_annotations(&labels);
        info!(
            sub_cluster = %sub_cluster_id,
            namespace = %state.name(),
            derived = annotations.len(),
            "reconciling hunbu namespace annotations"
        );

        self.host.ensure_namespace(sub_cluster_id, state.name()).await?;
        if annotations.is_empty() {
            return Ok(());
        }
        self.host
            .merge_namespace_annotations(sub_cluster_id, state.name(), &annotations)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedlink_common::types::FederatedNamespace;
    use fedlink_gateway::memory::InMemoryHostCluster;

    fn state() -> NamespaceState {
        NamespaceState {
            host_cluster_id: "cm-host-1".into(),
            namespace: FederatedNamespace {
                host_cluster_id: "cm-host-1".into(),
                name: "workloads".into(),
                sub_clusters: vec!["CM-SUB-2".into()],
                project_code: "proj-a".into(),
                created_at: None,
            },
            // Host annotations must never leak into a hunbu namespace
            host_annotations: [(
                keys::ANNO_IS_FEDERATED_NAMESPACE.to_string(),
                "true".to_string(),
            )]
            .into(),
            quotas: Vec::new(),
        }
    }

    fn mixer_labels() -> BTreeMap<String, String> {
        [
            (keys::LABEL_SCHEDULER_HUNBU.to_string(), "true".to_string()),
            (
                keys::LABEL_HUNBU_MIXER_CLUSTER.to_string(),
                "mixer-a".to_string(),
            ),
            (
                keys::LABEL_HUNBU_NETWORK_MODE.to_string(),
                "underlay".to_string(),
            ),
            (
                keys::LABEL_HUNBU_PREEMPTION_POLICY.to_string(),
                "Never".to_string(),
            ),
        ]
        .into()
    }

    /// Only derived annotations land on the sub-cluster namespace; host
    /// annotations are not copied wholesale.
    #[tokio::test]
    async fn test_only_derived_annotations_are_written() {
        let cluster = Arc::new(InMemoryHostCluster::default());
        cluster.seed_managed_cluster("cm-host-1", "CM-SUB-2", mixer_labels());

        let backend = HunbuBackend::new(cluster.clone());
        backend.create_or_update(&state(), "CM-SUB-2").await.unwrap();

        let annotations = cluster
            .namespace("CM-SUB-2", "workloads")
            .unwrap()
            .metadata
            .annotations
            .unwrap();
        assert_eq!(
            annotations
                .get(keys::ANNO_HUNBU_MIXER_CLUSTER)
                .map(String::as_str),
            Some("mixer-a")
        );
        assert_eq!(
            annotations
                .get(keys::ANNO_HUNBU_NETWORK_MODE)
                .map(String::as_str),
            Some("underlay")
        );
        assert_eq!(
            annotations
                .get(keys::ANNO_HUNBU_PREEMPTION_POLICY)
                .map(String::as_str),
            Some("Never")
        );
        // Unset labels derive no annotation
        assert!(!annotations.contains_key(keys::ANNO_HUNBU_PREEMPTION_CLASS));
        // Host-side markers never leak
        assert!(!annotations.contains_key(keys::ANNO_IS_FEDERATED_NAMESPACE));
    }

    #[tokio::test]
    async fn test_unregistered_sub_cluster_is_a_precondition_failure() {
        let cluster = Arc::new(InMemoryHostCluster::default());
        let backend = HunbuBackend::new(cluster);

        let err = backend
            .create_or_update(&state(), "CM-SUB-2")
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("CM-SUB-2"));
    }

    #[tokio::test]
    async fn test_reconcile_twice_is_idempotent() {
        let cluster = Arc::new(InMemoryHostCluster::default());
        cluster.seed_managed_cluster("cm-host-1", "CM-SUB-2", mixer_labels());

        let backend = HunbuBackend::new(cluster.clone());
        let state = state();
        backend.create_or_update(&state, "CM-SUB-2").await.unwrap();
        let first = cluster
            .namespace("CM-SUB-2", "workloads")
            .unwrap()
            .metadata
            .annotations;
        backend.create_or_update(&state, "CM-SUB-2").await.unwrap();
        let second = cluster
            .namespace("CM-SUB-2", "workloads")
            .unwrap()
            .metadata
            .annotations;
        assert_eq!(first, second);
    }
}
