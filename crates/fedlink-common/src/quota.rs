//! MultiClusterResourceQuota Custom Resource Definition
//!
//! One quota object exists per namespace per quota name, on both host and
//! sub-clusters. Quotas are created by the sync pipeline on first encounter
//! of a namespace/backend pair and updated in place thereafter; deletion is
//! always an explicit operation, never implicit.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group of the quota custom resource
pub const QUOTA_GROUP: &str = "federation.bkbcs.tencent.com";
/// API version of the quota custom resource
pub const QUOTA_VERSION: &str = "v1";

/// Aggregate hard limits for a namespace across its sub-clusters
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TotalQuota {
    /// Resource-name to quantity hard limits
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hard: BTreeMap<String, Quantity>,
}

/// Selects the sub-clusters a quota line applies to
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuotaClusterSelector {
    /// Label selector over managed clusters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
}

/// Spec of the MultiClusterResourceQuota custom resource
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "federation.bkbcs.tencent.com",
    version = "v1",
    kind = "MultiClusterResourceQuota",
    plural = "multiclusterresourcequotas",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct MultiClusterResourceQuotaSpec {
    /// Hard resource limits spanning the selected sub-clusters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_quota: Option<TotalQuota>,

    /// Free-form task-selector labels routing the quota to a backend
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub task_selector: BTreeMap<String, String>,

    /// Optional cluster selector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_selector: Option<QuotaClusterSelector>,
}

/// Request to create (or replace) a namespace quota on a federation cluster.
///
/// This is the external API shape; [`Self::to_quota`] converts it into the
/// custom resource written to the cluster.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateFederationClusterNamespaceQuotaRequest {
    /// Target namespace
    pub namespace: String,
    /// Quota object name
    pub quota_name: String,
    /// Resource-name to quantity strings (e.g. "cpu" -> "200")
    #[serde(default)]
    pub hard: BTreeMap<String, String>,
    /// Task-selector labels routing the quota to a backend
    #[serde(default)]
    pub task_selector: BTreeMap<String, String>,
    /// Annotations to set on the quota object (backend routing keys live here)
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl CreateFederationClusterNamespaceQuotaRequest {
    /// Build the custom resource this request describes
    pub fn to_quota(&self) -> MultiClusterResourceQuota {
        let mut quota = MultiClusterResourceQuota::new(
            &self.quota_name,
            MultiClusterResourceQuotaSpec {
                total_quota: Some(TotalQuota {
                    hard: self
                        .hard
                        .iter()
                        .map(|(k, v)| (k.clone(), Quantity(v.clone())))
                        .collect(),
                }),
                task_selector: self.task_selector.clone(),
                cluster_selector: None,
            },
        );
        quota.metadata.namespace = Some(self.namespace.clone());
        if !self.annotations.is_empty() {
            quota.metadata.annotations = Some(self.annotations.clone());
        }
        quota
    }
}

impl MultiClusterResourceQuota {
    /// Whether this quota line is annotated as belonging to `backend_key`
    pub fn routes_to(&self, backend_key: &str) -> bool {
        self.metadata
            .annotations
            .as_ref()
            .map(|a| a.contains_key(backend_key))
            .unwrap_or(false)
    }

    /// The hard-limit map, empty if no total quota is set
    pub fn hard(&self) -> BTreeMap<String, Quantity> {
        self.spec
            .total_quota
            .as_ref()
            .map(|t| t.hard.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;

    fn request() -> CreateFederationClusterNamespaceQuotaRequest {
        CreateFederationClusterNamespaceQuotaRequest {
            namespace: "workloads".into(),
            quota_name: "gpu-quota".into(),
            hard: [
                ("cpu".to_string(), "200".to_string()),
                ("memory".to_string(), "512Gi".to_string()),
                ("nvidia.com/gpu".to_string(), "8".to_string()),
            ]
            .into(),
            task_selector: [("pool".to_string(), "gpu".to_string())].into(),
            annotations: [(keys::ANNO_QUOTA_TAIJI.to_string(), "true".to_string())].into(),
        }
    }

    /// A quota built from a request and read back carries identical
    /// hard quantities for every resource name supplied.
    #[test]
    fn test_request_to_quota_preserves_hard_limits() {
        let req = request();
        let quota = req.to_quota();

        let hard = quota.hard();
        assert_eq!(hard.len(), req.hard.len());
        for (name, value) in &req.hard {
            assert_eq!(hard.get(name), Some(&Quantity(value.clone())));
        }
        assert_eq!(quota.metadata.namespace.as_deref(), Some("workloads"));
        assert_eq!(quota.metadata.name.as_deref(), Some("gpu-quota"));
    }

    #[test]
    fn test_quota_roundtrips_through_json() {
        let quota = request().to_quota();
        let json = serde_json::to_string(&quota).unwrap();
        let back: MultiClusterResourceQuota = serde_json::from_str(&json).unwrap();
        assert_eq!(quota.hard(), back.hard());
        assert_eq!(quota.spec.task_selector, back.spec.task_selector);
    }

    #[test]
    fn test_backend_routing_annotation() {
        let quota = request().to_quota();
        assert!(quota.routes_to(keys::ANNO_QUOTA_TAIJI));
        assert!(!quota.routes_to(keys::ANNO_QUOTA_SUANLI));
        assert!(!quota.routes_to(keys::ANNO_QUOTA_HUNBU));
    }

    #[test]
    fn test_quota_without_total_has_empty_hard() {
        let quota = MultiClusterResourceQuota::new(
            "empty",
            MultiClusterResourceQuotaSpec::default(),
        );
        assert!(quota.hard().is_empty());
        assert!(!quota.routes_to(keys::ANNO_QUOTA_TAIJI));
    }
}
