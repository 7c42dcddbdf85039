//! Core data types: the persisted FederationCluster record and the
//! federated namespace view derived from host-cluster annotations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Namespace;
use serde::{Deserialize, Serialize};

use crate::keys;

/// Lifecycle status of a federation cluster record.
///
/// Transitions are driven only by the installation pipeline and its
/// failure callback.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum FederationClusterStatus {
    /// Installation pipeline started, control plane not yet registered
    #[default]
    Creating,
    /// Registered and serving
    Running,
    /// An installation step failed irrecoverably
    CreateFailed,
    /// Deletion in progress
    Deleting,
    /// Deletion failed
    DeleteFailed,
    /// Deleted (record kept for audit)
    Deleted,
}

impl std::fmt::Display for FederationClusterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Creating => "Creating",
            Self::Running => "Running",
            Self::CreateFailed => "CreateFailed",
            Self::Deleting => "Deleting",
            Self::DeleteFailed => "DeleteFailed",
            Self::Deleted => "Deleted",
        };
        f.write_str(s)
    }
}

/// Persisted federation-cluster metadata, independent of the underlying
/// Kubernetes objects. Exactly one record exists per federation cluster ID.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct FederationCluster {
    /// Cluster running the federation control plane
    pub host_cluster_id: String,
    /// The federation (proxy) cluster entry in the registry
    pub federation_cluster_id: String,
    /// User-facing name
    pub federation_cluster_name: String,
    /// Project ID owning the federation
    pub project_id: String,
    /// Project code owning the federation
    pub project_code: String,
    /// User that triggered creation
    pub creator: String,
    /// Free-form extras copied from labels; includes the task-ID binding
    #[serde(default)]
    pub extras: BTreeMap<String, String>,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Soft-delete flag
    #[serde(default)]
    pub is_deleted: bool,
    /// Lifecycle status
    #[serde(default)]
    pub status: FederationClusterStatus,
}

/// A namespace participating in the federation, reconstructed from the
/// host cluster's namespace annotations. Never stored.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct FederatedNamespace {
    /// Host cluster the namespace lives on
    pub host_cluster_id: String,
    /// Namespace name
    pub name: String,
    /// Declared sub-cluster range, upper-cased
    pub sub_clusters: Vec<String>,
    /// Project code owning the namespace
    pub project_code: String,
    /// Namespace creation time on the host cluster
    pub created_at: Option<DateTime<Utc>>,
}

impl FederatedNamespace {
    /// Derive the federated view of a host-cluster namespace.
    ///
    /// Returns `None` when the namespace is not annotated as federated.
    pub fn from_namespace(host_cluster_id: &str, ns: &Namespace) -> Option<Self> {
        let annotations = ns.metadata.annotations.as_ref()?;
        if annotations
            .get(keys::ANNO_IS_FEDERATED_NAMESPACE)
            .map(String::as_str)
            != Some(keys::VALUE_TRUE)
        {
            return None;
        }

        let name = ns.metadata.name.clone()?;

        // An absent or empty cluster-range yields an empty sub-cluster list.
        // Defaulting to "all sub-clusters" was considered and deliberately
        // not introduced; the upstream semantics are unconfirmed.
        let sub_clusters = annotations
            .get(keys::ANNO_CLUSTER_RANGE)
            .map(|range| parse_cluster_range(range))
            .unwrap_or_default();

        let project_code = annotations
            .get(keys::ANNO_PROJECT_CODE)
            .cloned()
            .unwrap_or_default();

        let created_at = ns
            .metadata
            .creation_timestamp
            .as_ref()
            .map(|t| t.0);

        Some(Self {
            host_cluster_id: host_cluster_id.to_string(),
            name,
            sub_clusters,
            project_code,
            created_at,
        })
    }
}

/// Parse a comma-separated cluster range, trimming and upper-casing entries.
pub fn parse_cluster_range(range: &str) -> Vec<String> {
    range
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .collect()
}
