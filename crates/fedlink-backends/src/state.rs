//! Namespace state snapshot passed between sync steps.
//!
//! Fetched once from the host cluster and serialized into the task
//! parameter bag so the backend-specific steps do not each re-query the
//! host cluster.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fedlink_common::quota::MultiClusterResourceQuota;
use fedlink_common::types::FederatedNamespace;

/// Snapshot of a federated namespace and its quota objects on the host.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceState {
    /// Host cluster the snapshot was taken from
    pub host_cluster_id: String,
    /// The federated view of the namespace
    pub namespace: FederatedNamespace,
    /// Full annotation map of the host namespace
    #[serde(default)]
    pub host_annotations: BTreeMap<String, String>,
    /// Every MultiClusterResourceQuota in the namespace on the host
    #[serde(default)]
    pub quotas: Vec<MultiClusterResourceQuota>,
}

impl NamespaceState {
    /// The namespace name
    pub fn name(&self) -> &str {
        &self.namespace.name
    }

    /// Read a host-namespace annotation
    pub fn host_annotation(&self, key: &str) -> Option<&str> {
        self.host_annotations.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedlink_common::keys;

    #[test]
    fn test_state_roundtrips_through_json() {
        let state = NamespaceState {
            host_cluster_id: "cm-host-1".into(),
            namespace: FederatedNamespace {
                host_cluster_id: "cm-host-1".into(),
                name: "workloads".into(),
                sub_clusters: vec!["CM-SUB-1".into()],
                project_code: "proj-a".into(),
                created_at: None,
            },
            host_annotations: [(
                keys::ANNO_IS_FEDERATED_NAMESPACE.to_string(),
                "true".to_string(),
            )]
            .into(),
            quotas: Vec::new(),
        };

        let json = serde_json::to_string(&state).unwrap();
        let back: NamespaceState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name(), "workloads");
        assert_eq!(
            back.host_annotation(keys::ANNO_IS_FEDERATED_NAMESPACE),
            Some("true")
        );
        assert_eq!(back.namespace.sub_clusters, vec!["CM-SUB-1"]);
    }
}
