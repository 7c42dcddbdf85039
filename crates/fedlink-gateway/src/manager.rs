//! RPC client for the central cluster registry/manager.
//!
//! The wire transport (gRPC plus service discovery) is supplied by the
//! embedding binary through [`ClusterManagerTransport`]; this module owns
//! the envelope discipline, error conversion, and the label merge rules.
//!
//! Label mutation is always get-then-merge-then-write, never a wholesale
//! replace, so labels owned by other systems survive our updates.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use fedlink_common::{Error, Result};

/// Name used as the error target for registry failures
const TARGET: &str = "cluster-manager";

/// Registry-side status of a cluster entry.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum RegistryClusterStatus {
    /// Placeholder entry created at the start of installation
    #[default]
    Initialization,
    /// Registered and serving
    Running,
    /// Installation failed irrecoverably
    CreateFailure,
    /// Deletion in progress
    Deleting,
    /// Deletion failed
    DeleteFailure,
}

impl RegistryClusterStatus {
    /// Wire representation used by the registry
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialization => "INITIALIZATION",
            Self::Running => "RUNNING",
            Self::CreateFailure => "CREATE-FAILURE",
            Self::Deleting => "DELETING",
            Self::DeleteFailure => "DELETE-FAILURE",
        }
    }
}

impl std::fmt::Display for RegistryClusterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cluster entry as the registry returns it.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterEntry {
    /// Registry-assigned cluster ID
    pub cluster_id: String,
    /// User-facing cluster name
    pub cluster_name: String,
    /// Project owning the cluster
    pub project_id: String,
    /// Creator recorded by the registry
    #[serde(default)]
    pub creator: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Registry-side status string (e.g. "RUNNING")
    #[serde(default)]
    pub status: String,
    /// Labels on the registry entry
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// Request to create a cluster entry in the registry.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusterRequest {
    /// User-facing cluster name
    pub cluster_name: String,
    /// Project owning the cluster
    pub project_id: String,
    /// Creator to record
    pub creator: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Initial status
    pub status: RegistryClusterStatus,
    /// Initial labels
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// A cloud subnet as listed by the registry.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CloudSubnet {
    /// Subnet ID
    pub subnet_id: String,
    /// Availability zone
    #[serde(default)]
    pub zone: String,
    /// CIDR block
    #[serde(default)]
    pub cidr: String,
    /// Free IP count
    #[serde(default)]
    pub available_ip_count: u64,
}

/// The registry's RPC envelope: `result=false` is an application failure.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RpcEnvelope<T> {
    /// Whether the call succeeded
    pub result: bool,
    /// Upstream message (failure detail or informational)
    #[serde(default)]
    pub message: String,
    /// Payload when `result` is true
    #[serde(default = "none_data", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

fn none_data<T>() -> Option<T> {
    None
}

impl<T> RpcEnvelope<T> {
    /// A successful envelope carrying `data`
    pub fn ok(data: T) -> Self {
        Self {
            result: true,
            message: String::new(),
            data: Some(data),
        }
    }

    /// A successful envelope with no payload
    pub fn ok_empty() -> Self {
        Self {
            result: true,
            message: String::new(),
            data: None,
        }
    }

    /// A failed envelope with an upstream message
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            result: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Raw transport to the registry. Carries the bearer token and
/// client-identity header; transport failures are returned verbatim.
#[async_trait]
pub trait ClusterManagerTransport: Send + Sync {
    /// Create a cluster entry; the registry assigns the cluster ID
    async fn create_cluster(
        &self,
        req: &CreateClusterRequest,
    ) -> Result<RpcEnvelope<ClusterEntry>>;

    /// Fetch a cluster entry by ID
    async fn get_cluster(&self, cluster_id: &str) -> Result<RpcEnvelope<ClusterEntry>>;

    /// Transition a cluster entry's status
    async fn update_cluster_status(
        &self,
        cluster_id: &str,
        status: RegistryClusterStatus,
    ) -> Result<RpcEnvelope<ClusterEntry>>;

    /// Delete a cluster entry
    async fn delete_cluster(&self, cluster_id: &str) -> Result<RpcEnvelope<()>>;

    /// Fetch the full label map of a cluster entry
    async fn get_cluster_labels(
        &self,
        cluster_id: &str,
    ) -> Result<RpcEnvelope<BTreeMap<String, String>>>;

    /// Replace the full label map of a cluster entry.
    ///
    /// Callers never invoke this directly with a partial map; the client
    /// merges first.
    async fn update_cluster_labels(
        &self,
        cluster_id: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<RpcEnvelope<()>>;

    /// Store the kubeconfig credential for a cluster entry
    async fn update_cluster_kubeconfig(
        &self,
        cluster_id: &str,
        kubeconfig: &str,
    ) -> Result<RpcEnvelope<()>>;

    /// List subnets for a cloud/region pair
    async fn list_cloud_subnets(
        &self,
        cloud_id: &str,
        region: &str,
    ) -> Result<RpcEnvelope<Vec<CloudSubnet>>>;
}

/// Client for cluster CRUD, status transitions, and label bookkeeping
/// against the central registry.
#[derive(Clone)]
pub struct ClusterManagerClient {
    transport: Arc<dyn ClusterManagerTransport>,
}

impl ClusterManagerClient {
    /// Wrap a transport
    pub fn new(transport: Arc<dyn ClusterManagerTransport>) -> Self {
        Self { transport }
    }

    /// Create a cluster entry and return it (with the assigned ID)
    pub async fn create_cluster(&self, req: &CreateClusterRequest) -> Result<ClusterEntry> {
        let env = self.transport.create_cluster(req).await?;
        require_data(env, "create cluster")
    }

    /// Fetch a cluster entry
    pub async fn get_cluster(&self, cluster_id: &str) -> Result<ClusterEntry> {
        let env = self.transport.get_cluster(cluster_id).await?;
        require_data(env, &format!("get cluster {}", cluster_id))
    }

    /// Transition a cluster entry's status
    pub async fn update_cluster_status(
        &self,
        cluster_id: &str,
        status: RegistryClusterStatus,
    ) -> Result<ClusterEntry> {
        debug!(cluster = %cluster_id, status = %status, "updating registry cluster status");
        let env = self.transport.update_cluster_status(cluster_id, status).await?;
        require_data(env, &format!("update status of {}", cluster_id))
    }

    /// Delete a cluster entry
    pub async fn delete_cluster(&self, cluster_id: &str) -> Result<()> {
        let env = self.transport.delete_cluster(cluster_id).await?;
        require_ok(env, &format!("delete cluster {}", cluster_id))
    }

    /// Fetch a cluster entry's labels
    pub async fn get_cluster_labels(
        &self,
        cluster_id: &str,
    ) -> Result<BTreeMap<String, String>> {
        let env = self.transport.get_cluster_labels(cluster_id).await?;
        require_data(env, &format!("get labels of {}", cluster_id))
    }

    /// Merge `labels` into the cluster entry's existing labels.
    ///
    /// Overlapping keys take the new value; labels owned by other writers
    /// are preserved.
    pub async fn add_cluster_labels(
        &self,
        cluster_id: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<()> {
        let mut merged = self.get_cluster_labels(cluster_id).await?;
        merged.extend(labels.iter().map(|(k, v)| (k.clone(), v.clone())));

        let env = self
            .transport
            .update_cluster_labels(cluster_id, &merged)
            .await?;
        require_ok(env, &format!("update labels of {}", cluster_id))
    }

    /// Remove `keys` from the cluster entry's labels.
    ///
    /// Removing an absent key is a no-op, never an error.
    pub async fn delete_cluster_labels(&self, cluster_id: &str, keys: &[&str]) -> Result<()> {
        let mut labels = self.get_cluster_labels(cluster_id).await?;
        for key in keys {
            labels.remove(*key);
        }

        let env = self
            .transport
            .update_cluster_labels(cluster_id, &labels)
            .await?;
        require_ok(env, &format!("update labels of {}", cluster_id))
    }

    /// Store the kubeconfig credential for a cluster entry
    pub async fn update_cluster_kubeconfig(
        &self,
        cluster_id: &str,
        kubeconfig: &str,
    ) -> Result<()> {
        let env = self
            .transport
            .update_cluster_kubeconfig(cluster_id, kubeconfig)
            .await?;
        require_ok(env, &format!("update kubeconfig of {}", cluster_id))
    }

    /// List subnets for a cloud/region pair
    pub async fn list_cloud_subnets(
        &self,
        cloud_id: &str,
        region: &str,
    ) -> Result<Vec<CloudSubnet>> {
        let env = self.transport.list_cloud_subnets(cloud_id, region).await?;
        require_data(env, &format!("list subnets of {}/{}", cloud_id, region))
    }
}

/// Unwrap an envelope that must carry data.
fn require_data<T>(env: RpcEnvelope<T>, op: &str) -> Result<T> {
    if !env.result {
        return Err(Error::application(TARGET, 1, format!("{}: {}", op, env.message)));
    }
    env.data
        .ok_or_else(|| Error::application(TARGET, 1, format!("{}: empty response data", op)))
}

/// Unwrap an envelope where success alone matters.
fn require_ok<T>(env: RpcEnvelope<T>, op: &str) -> Result<()> {
    if !env.result {
        return Err(Error::application(TARGET, 1, format!("{}: {}", op, env.message)));
    }
    Ok(())
}
