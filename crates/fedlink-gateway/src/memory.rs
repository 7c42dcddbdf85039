//! In-memory gateway implementations.
//!
//! Back the [`ClusterManagerTransport`] and [`HostClusterApi`] seams with
//! process-local maps. Used by tests and local dry-runs; behavior mirrors
//! the real endpoints including conflict-on-create and not-found-as-None.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use k8s_openapi::api::core::v1::{Namespace, Secret};
use kube::api::DynamicObject;

use fedlink_common::quota::MultiClusterResourceQuota;
use fedlink_common::{Error, Result};

use crate::host::HostClusterApi;
use crate::manager::{
    CloudSubnet, ClusterEntry, ClusterManagerTransport, CreateClusterRequest, RegistryClusterStatus,
    RpcEnvelope,
};

fn not_found(what: &str) -> kube::Error {
    kube::Error::Api(kube::core::ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{} not found", what),
        reason: "NotFound".to_string(),
        code: 404,
    })
}

fn conflict(what: &str) -> kube::Error {
    kube::Error::Api(kube::core::ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{} already exists", what),
        reason: "AlreadyExists".to_string(),
        code: 409,
    })
}

// ---------------------------------------------------------------------------
// Cluster manager
// ---------------------------------------------------------------------------

/// In-memory cluster registry.
#[derive(Default)]
pub struct InMemoryClusterManager {
    clusters: DashMap<String, ClusterEntry>,
    kubeconfigs: DashMap<String, String>,
    subnets: DashMap<String, Vec<CloudSubnet>>,
    next_id: AtomicU64,
}

impl InMemoryClusterManager {
    /// The stored kubeconfig of a cluster, if one was uploaded
    pub fn kubeconfig(&self, cluster_id: &str) -> Option<String> {
        self.kubeconfigs.get(cluster_id).map(|v| v.clone())
    }

    /// Registry-side view of a cluster entry
    pub fn entry(&self, cluster_id: &str) -> Option<ClusterEntry> {
        self.clusters.get(cluster_id).map(|v| v.clone())
    }

    /// Seed subnets for a cloud/region pair
    pub fn seed_subnets(&self, cloud_id: &str, region: &str, subnets: Vec<CloudSubnet>) {
        self.subnets.insert(format!("{}/{}", cloud_id, region), subnets);
    }

    /// Seed an entry under its own cluster ID (pre-existing clusters)
    pub fn seed_entry(&self, entry: ClusterEntry) {
        self.clusters.insert(entry.cluster_id.clone(), entry);
    }
}

#[async_trait]
impl ClusterManagerTransport for InMemoryClusterManager {
    async fn create_cluster(
        &self,
        req: &CreateClusterRequest,
    ) -> Result<RpcEnvelope<ClusterEntry>> {
        let id = format!("cm-fed-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let entry = ClusterEntry {
            cluster_id: id.clone(),
            cluster_name: req.cluster_name.clone(),
            project_id: req.project_id.clone(),
            creator: req.creator.clone(),
            description: req.description.clone(),
            status: req.status.as_str().to_string(),
            labels: req.labels.clone(),
        };
        self.clusters.insert(id, entry.clone());
        Ok(RpcEnvelope::ok(entry))
    }

    async fn get_cluster(&self, cluster_id: &str) -> Result<RpcEnvelope<ClusterEntry>> {
        match self.clusters.get(cluster_id) {
            Some(entry) => Ok(RpcEnvelope::ok(entry.clone())),
            None => Ok(RpcEnvelope::failed(format!(
                "cluster {} not found",
                cluster_id
            ))),
        }
    }

    async fn update_cluster_status(
        &self,
        cluster_id: &str,
        status: RegistryClusterStatus,
    ) -> Result<RpcEnvelope<ClusterEntry>> {
        match self.clusters.get_mut(cluster_id) {
            Some(mut entry) => {
                entry.status = status.as_str().to_string();
                Ok(RpcEnvelope::ok(entry.clone()))
            }
            None => Ok(RpcEnvelope::failed(format!(
                "cluster {} not found",
                cluster_id
            ))),
        }
    }

    async fn delete_cluster(&self, cluster_id: &str) -> Result<RpcEnvelope<()>> {
        self.clusters.remove(cluster_id);
        Ok(RpcEnvelope::ok_empty())
    }

    async fn get_cluster_labels(
        &self,
        cluster_id: &str,
    ) -> Result<RpcEnvelope<BTreeMap<String, String>>> {
        match self.clusters.get(cluster_id) {
            Some(entry) => Ok(RpcEnvelope::ok(entry.labels.clone())),
            None => Ok(RpcEnvelope::failed(format!(
                "cluster {} not found",
                cluster_id
            ))),
        }
    }

    async fn update_cluster_labels(
        &self,
        cluster_id: &str,
        labels: &BTreeMap<String, String>,
    ) -> Result<RpcEnvelope<()>> {
        match self.clusters.get_mut(cluster_id) {
            Some(mut entry) => {
                entry.labels = labels.clone();
                Ok(RpcEnvelope::ok_empty())
            }
            None => Ok(RpcEnvelope::failed(format!(
                "cluster {} not found",
                cluster_id
            ))),
        }
    }

    async fn update_cluster_kubeconfig(
        &self,
        cluster_id: &str,
        kubeconfig: &str,
    ) -> Result<RpcEnvelope<()>> {
        if !self.clusters.contains_key(cluster_id) {
            return Ok(RpcEnvelope::failed(format!(
                "cluster {} not found",
                cluster_id
            )));
        }
        self.kubeconfigs
            .insert(cluster_id.to_string(), kubeconfig.to_string());
        Ok(RpcEnvelope::ok_empty())
    }

    async fn list_cloud_subnets(
        &self,
        cloud_id: &str,
        region: &str,
    ) -> Result<RpcEnvelope<Vec<CloudSubnet>>> {
        let key = format!("{}/{}", cloud_id, region);
        Ok(RpcEnvelope::ok(
            self.subnets.get(&key).map(|v| v.clone()).unwrap_or_default(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Host cluster
// ---------------------------------------------------------------------------

type ClusterScoped = (String, String);
type NamespaceScoped = (String, String, String);

/// In-memory host/sub-cluster surface.
#[derive(Default)]
pub struct InMemoryHostCluster {
    namespaces: DashMap<ClusterScoped, Namespace>,
    secrets: DashMap<NamespaceScoped, Secret>,
    loadbalancer_ips: DashMap<NamespaceScoped, String>,
    healthy_addresses: DashSet<String>,
    quotas: DashMap<NamespaceScoped, MultiClusterResourceQuota>,
    managed_clusters: DashMap<ClusterScoped, DynamicObject>,
    registration_requests: DashMap<ClusterScoped, DynamicObject>,
}

impl InMemoryHostCluster {
    /// Seed a namespace on a cluster
    pub fn seed_namespace(&self, cluster_id: &str, namespace: Namespace) {
        let name = namespace.metadata.name.clone().unwrap_or_default();
        self.namespaces
            .insert((cluster_id.to_string(), name), namespace);
    }

    /// Seed a quota object on a cluster
    pub fn seed_quota(&self, cluster_id: &str, quota: MultiClusterResourceQuota) {
        let namespace = quota.metadata.namespace.clone().unwrap_or_default();
        let name = quota.metadata.name.clone().unwrap_or_default();
        self.quotas
            .insert((cluster_id.to_string(), namespace, name), quota);
    }

    /// Assign a load-balancer IP to a service
    pub fn set_loadbalancer_ip(&self, cluster_id: &str, namespace: &str, name: &str, ip: &str) {
        self.loadbalancer_ips.insert(
            (
                cluster_id.to_string(),
                namespace.to_string(),
                name.to_string(),
            ),
            ip.to_string(),
        );
    }

    /// Mark an API server address as serving
    pub fn set_address_healthy(&self, address: &str) {
        self.healthy_addresses.insert(address.to_string());
    }

    /// Seed a clusternet ManagedCluster with the given labels
    pub fn seed_managed_cluster(
        &self,
        cluster_id: &str,
        name: &str,
        labels: BTreeMap<String, String>,
    ) {
        let ar = kube::discovery::ApiResource {
            group: crate::host::CLUSTERNET_GROUP.to_string(),
            version: crate::host::CLUSTERNET_VERSION.to_string(),
            api_version: format!(
                "{}/{}",
                crate::host::CLUSTERNET_GROUP,
                crate::host::CLUSTERNET_VERSION
            ),
            kind: "ManagedCluster".to_string(),
            plural: "managedclusters".to_string(),
        };
        let mut obj = DynamicObject::new(name, &ar);
        obj.metadata.labels = Some(labels);
        self.managed_clusters
            .insert((cluster_id.to_string(), name.to_string()), obj);
    }

    /// Read back a namespace (test assertions)
    pub fn namespace(&self, cluster_id: &str, name: &str) -> Option<Namespace> {
        self.namespaces
            .get(&(cluster_id.to_string(), name.to_string()))
            .map(|v| v.clone())
    }

    /// Read back a quota (test assertions)
    pub fn quota(
        &self,
        cluster_id: &str,
        namespace: &str,
        name: &str,
    ) -> Option<MultiClusterResourceQuota> {
        self.quotas
            .get(&(
                cluster_id.to_string(),
                namespace.to_string(),
                name.to_string(),
            ))
            .map(|v| v.clone())
    }
}

#[async_trait]
impl HostClusterApi for InMemoryHostCluster {
    async fn get_namespace(&self, cluster_id: &str, name: &str) -> Result<Option<Namespace>> {
        Ok(self.namespace(cluster_id, name))
    }

    async fn create_namespace(&self, cluster_id: &str, namespace: &Namespace) -> Result<()> {
        let name = namespace.metadata.name.clone().unwrap_or_default();
        let key = (cluster_id.to_string(), name);
        if self.namespaces.contains_key(&key) {
            return Err(Error::from(conflict("namespace")));
        }
        self.namespaces.insert(key, namespace.clone());
        Ok(())
    }

    async fn ensure_namespace(&self, cluster_id: &str, name: &str) -> Result<()> {
        let key = (cluster_id.to_string(), name.to_string());
        self.namespaces.entry(key).or_insert_with(|| Namespace {
            metadata: kube::api::ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        });
        Ok(())
    }

    async fn merge_namespace_annotations(
        &self,
        cluster_id: &str,
        name: &str,
        annotations: &BTreeMap<String, String>,
    ) -> Result<()> {
        let key = (cluster_id.to_string(), name.to_string());
        let mut entry = self
            .namespaces
            .get_mut(&key)
            .ok_or_else(|| Error::from(not_found("namespace")))?;
        let merged = entry.metadata.annotations.get_or_insert_with(BTreeMap::new);
        merged.extend(annotations.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    async fn get_secret(
        &self,
        cluster_id: &str,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Secret>> {
        Ok(self
            .secrets
            .get(&(
                cluster_id.to_string(),
                namespace.to_string(),
                name.to_string(),
            ))
            .map(|v| v.clone()))
    }

    async fn list_secrets(&self, cluster_id: &str, namespace: &str) -> Result<Vec<Secret>> {
        Ok(self
            .secrets
            .iter()
            .filter(|entry| entry.key().0 == cluster_id && entry.key().1 == namespace)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn create_secret(&self, cluster_id: &str, secret: &Secret) -> Result<()> {
        let namespace = secret.metadata.namespace.clone().unwrap_or_default();
        let name = secret.metadata.name.clone().unwrap_or_default();
        let key = (cluster_id.to_string(), namespace, name);
        if self.secrets.contains_key(&key) {
            return Err(Error::from(conflict("secret")));
        }
        self.secrets.insert(key, secret.clone());
        Ok(())
    }

    async fn get_service_loadbalancer_ip(
        &self,
        cluster_id: &str,
        namespace: &str,
        name: &str,
    ) -> Result<Option<String>> {
        Ok(self
            .loadbalancer_ips
            .get(&(
                cluster_id.to_string(),
                namespace.to_string(),
                name.to_string(),
            ))
            .map(|v| v.clone()))
    }

    async fn check_api_address(&self, address: &str) -> Result<bool> {
        Ok(self.healthy_addresses.contains(address))
    }

    async fn list_quotas(
        &self,
        cluster_id: &str,
        namespace: &str,
    ) -> Result<Vec<MultiClusterResourceQuota>> {
        Ok(self
            .quotas
            .iter()
            .filter(|entry| entry.key().0 == cluster_id && entry.key().1 == namespace)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn get_quota(
        &self,
        cluster_id: &str,
        namespace: &str,
        name: &str,
    ) -> Result<Option<MultiClusterResourceQuota>> {
        Ok(self.quota(cluster_id, namespace, name))
    }

    async fn create_quota(
        &self,
        cluster_id: &str,
        quota: &MultiClusterResourceQuota,
    ) -> Result<()> {
        let namespace = quota.metadata.namespace.clone().unwrap_or_default();
        let name = quota.metadata.name.clone().unwrap_or_default();
        let key = (cluster_id.to_string(), namespace, name);
        if self.quotas.contains_key(&key) {
            return Err(Error::from(conflict("quota")));
        }
        self.quotas.insert(key, quota.clone());
        Ok(())
    }

    async fn update_quota(
        &self,
        cluster_id: &str,
        quota: &MultiClusterResourceQuota,
    ) -> Result<()> {
        let namespace = quota.metadata.namespace.clone().unwrap_or_default();
        let name = quota.metadata.name.clone().unwrap_or_default();
        let key = (cluster_id.to_string(), namespace, name);
        let mut entry = self
            .quotas
            .get_mut(&key)
            .ok_or_else(|| Error::from(not_found("quota")))?;
        entry.spec = quota.spec.clone();
        Ok(())
    }

    async fn delete_quota(&self, cluster_id: &str, namespace: &str, name: &str) -> Result<()> {
        self.quotas.remove(&(
            cluster_id.to_string(),
            namespace.to_string(),
            name.to_string(),
        ));
        Ok(())
    }

    async fn get_managed_cluster(
        &self,
        cluster_id: &str,
        name: &str,
    ) -> Result<Option<DynamicObject>> {
        Ok(self
            .managed_clusters
            .get(&(cluster_id.to_string(), name.to_string()))
            .map(|v| v.clone()))
    }

    async fn delete_managed_cluster(&self, cluster_id: &str, name: &str) -> Result<()> {
        self.managed_clusters
            .remove(&(cluster_id.to_string(), name.to_string()));
        Ok(())
    }

    async fn get_cluster_registration_request(
        &self,
        cluster_id: &str,
        name: &str,
    ) -> Result<Option<DynamicObject>> {
        Ok(self
            .registration_requests
            .get(&(cluster_id.to_string(), name.to_string()))
            .map(|v| v.clone()))
    }

    async fn delete_cluster_registration_request(
        &self,
        cluster_id: &str,
        name: &str,
    ) -> Result<()> {
        self.registration_requests
            .remove(&(cluster_id.to_string(), name.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ok_if_not_found;

    /// Managed-cluster and registration-request lookups against a cluster
    /// with no matching object return `Ok(None)`, not an error.
    #[tokio::test]
    async fn test_absent_clusternet_objects_are_none() {
        let host = InMemoryHostCluster::default();
        assert!(host
            .get_managed_cluster("cm-host-1", "cm-sub-1")
            .await
            .unwrap()
            .is_none());
        assert!(host
            .get_cluster_registration_request("cm-host-1", "req-1")
            .await
            .unwrap()
            .is_none());
        // Deleting an absent object short-circuits to a no-op
        host.delete_managed_cluster("cm-host-1", "cm-sub-1")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_ensure_namespace_is_idempotent() {
        let host = InMemoryHostCluster::default();
        host.ensure_namespace("cm-sub-1", "clusternet-system")
            .await
            .unwrap();
        host.ensure_namespace("cm-sub-1", "clusternet-system")
            .await
            .unwrap();
        assert!(host.namespace("cm-sub-1", "clusternet-system").is_some());
    }

    #[tokio::test]
    async fn test_merge_preserves_existing_annotations() {
        let host = InMemoryHostCluster::default();
        host.seed_namespace(
            "cm-sub-1",
            Namespace {
                metadata: kube::api::ObjectMeta {
                    name: Some("ns".to_string()),
                    annotations: Some([("keep".to_string(), "me".to_string())].into()),
                    ..Default::default()
                },
                ..Default::default()
            },
        );

        host.merge_namespace_annotations(
            "cm-sub-1",
            "ns",
            &[("new".to_string(), "value".to_string())].into(),
        )
        .await
        .unwrap();

        let ns = host.namespace("cm-sub-1", "ns").unwrap();
        let annotations = ns.metadata.annotations.unwrap();
        assert_eq!(annotations.get("keep").map(String::as_str), Some("me"));
        assert_eq!(annotations.get("new").map(String::as_str), Some("value"));
    }

    #[tokio::test]
    async fn test_create_namespace_conflicts_on_duplicate() {
        let host = InMemoryHostCluster::default();
        let ns = Namespace {
            metadata: kube::api::ObjectMeta {
                name: Some("dup".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        host.create_namespace("cm-sub-1", &ns).await.unwrap();
        let err = host.create_namespace("cm-sub-1", &ns).await.unwrap_err();
        assert!(!err.is_retryable()); // 409 is a 4xx
    }

    #[test]
    fn test_ok_if_not_found_reexport_contract() {
        let res: Result<Option<u8>> = ok_if_not_found(Err(not_found("thing")));
        assert!(matches!(res, Ok(None)));
    }
}
