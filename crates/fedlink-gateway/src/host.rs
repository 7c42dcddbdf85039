//! Host/sub-cluster API surface.
//!
//! [`HostClusterApi`] is the seam every pipeline step talks through; the
//! trait allows swapping the real gateway-backed client for an in-memory
//! implementation in tests. [`GatewayHostClient`] is the real thing: each
//! method builds a fresh client for the target cluster, performs one
//! operation, and drops it.
//!
//! Absence of a managed cluster, registration request, bootstrap secret,
//! or namespace is success with an absent object, not an error; callers
//! check for `None` before use.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Secret, Service};
use kube::api::{Api, DeleteParams, DynamicObject, ListParams, Patch, PatchParams, PostParams};
use kube::discovery::ApiResource;
use tracing::debug;

use fedlink_common::quota::MultiClusterResourceQuota;
use fedlink_common::{Error, Result};

use crate::client;
use crate::config::GatewayConfig;

/// API group of the clusternet registration objects
pub const CLUSTERNET_GROUP: &str = "clusters.clusternet.io";
/// API version of the clusternet registration objects
pub const CLUSTERNET_VERSION: &str = "v1beta1";

/// Operations the pipelines perform against a specific cluster, reached
/// through the gateway by cluster ID.
#[async_trait]
pub trait HostClusterApi: Send + Sync {
    /// Get a namespace, `None` if it does not exist
    async fn get_namespace(&self, cluster_id: &str, name: &str) -> Result<Option<Namespace>>;

    /// Create a namespace
    async fn create_namespace(&self, cluster_id: &str, namespace: &Namespace) -> Result<()>;

    /// Create a namespace by name; an already-existing namespace is not an error
    async fn ensure_namespace(&self, cluster_id: &str, name: &str) -> Result<()>;

    /// Merge `annotations` into a namespace's existing annotations.
    ///
    /// Get-then-merge-then-write; existing keys not named here survive.
    async fn merge_namespace_annotations(
        &self,
        cluster_id: &str,
        name: &str,
        annotations: &BTreeMap<String, String>,
    ) -> Result<()>;

    /// Get a secret, `None` if it does not exist
    async fn get_secret(
        &self,
        cluster_id: &str,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Secret>>;

    /// List the secrets of a namespace
    async fn list_secrets(&self, cluster_id: &str, namespace: &str) -> Result<Vec<Secret>>;

    /// Create a secret
    async fn create_secret(&self, cluster_id: &str, secret: &Secret) -> Result<()>;

    /// Load-balancer ingress IP of a service, `None` while unassigned
    async fn get_service_loadbalancer_ip(
        &self,
        cluster_id: &str,
        namespace: &str,
        name: &str,
    ) -> Result<Option<String>>;

    /// Probe whether `address` serves a working Kubernetes API
    async fn check_api_address(&self, address: &str) -> Result<bool>;

    /// List the quota objects of a namespace
    async fn list_quotas(
        &self,
        cluster_id: &str,
        namespace: &str,
    ) -> Result<Vec<MultiClusterResourceQuota>>;

    /// Get a quota object, `None` if it does not exist
    async fn get_quota(
        &self,
        cluster_id: &str,
        namespace: &str,
        name: &str,
    ) -> Result<Option<MultiClusterResourceQuota>>;

    /// Create a quota object
    async fn create_quota(&self, cluster_id: &str, quota: &MultiClusterResourceQuota)
        -> Result<()>;

    /// Update a quota object's spec in place
    async fn update_quota(&self, cluster_id: &str, quota: &MultiClusterResourceQuota)
        -> Result<()>;

    /// Delete a quota object. Deletion is always explicit, never implied.
    async fn delete_quota(&self, cluster_id: &str, namespace: &str, name: &str) -> Result<()>;

    /// Look up a clusternet ManagedCluster by name, `None` if absent
    async fn get_managed_cluster(
        &self,
        cluster_id: &str,
        name: &str,
    ) -> Result<Option<DynamicObject>>;

    /// Delete a clusternet ManagedCluster; absence is a no-op
    async fn delete_managed_cluster(&self, cluster_id: &str, name: &str) -> Result<()>;

    /// Look up a clusternet ClusterRegistrationRequest by name, `None` if absent
    async fn get_cluster_registration_request(
        &self,
        cluster_id: &str,
        name: &str,
    ) -> Result<Option<DynamicObject>>;

    /// Delete a clusternet ClusterRegistrationRequest; absence is a no-op
    async fn delete_cluster_registration_request(
        &self,
        cluster_id: &str,
        name: &str,
    ) -> Result<()>;
}

/// Map a 404 API error to `Ok(None)`; everything else propagates.
pub fn ok_if_not_found<T>(res: std::result::Result<T, kube::Error>) -> Result<Option<T>> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(None),
        Err(e) => Err(Error::from(e)),
    }
}

/// Swallow a 409 on create; the object already existing is not an error.
pub fn ok_if_already_exists(res: std::result::Result<(), kube::Error>) -> Result<()> {
    match res {
        Ok(()) => Ok(()),
        Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(()),
        Err(e) => Err(Error::from(e)),
    }
}

/// ApiResource for a clusternet registration object kind.
fn clusternet_resource(kind: &str, plural: &str) -> ApiResource {
    ApiResource {
        group: CLUSTERNET_GROUP.to_string(),
        version: CLUSTERNET_VERSION.to_string(),
        api_version: format!("{}/{}", CLUSTERNET_GROUP, CLUSTERNET_VERSION),
        kind: kind.to_string(),
        plural: plural.to_string(),
    }
}

/// Gateway-backed [`HostClusterApi`] implementation.
pub struct GatewayHostClient {
    config: GatewayConfig,
}

impl GatewayHostClient {
    /// Create a client for the given gateway
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    fn namespaces(&self, cluster_id: &str) -> Result<Api<Namespace>> {
        Ok(Api::all(client::native_client(&self.config, cluster_id)?))
    }

    fn secrets(&self, cluster_id: &str, namespace: &str) -> Result<Api<Secret>> {
        Ok(Api::namespaced(
            client::native_client(&self.config, cluster_id)?,
            namespace,
        ))
    }

    fn services(&self, cluster_id: &str, namespace: &str) -> Result<Api<Service>> {
        Ok(Api::namespaced(
            client::native_client(&self.config, cluster_id)?,
            namespace,
        ))
    }

    fn quotas(&self, cluster_id: &str, namespace: &str) -> Result<Api<MultiClusterResourceQuota>> {
        Ok(Api::namespaced(
            client::dynamic_client(&self.config, cluster_id)?,
            namespace,
        ))
    }

    fn clusternet_objects(
        &self,
        cluster_id: &str,
        kind: &str,
        plural: &str,
    ) -> Result<Api<DynamicObject>> {
        Ok(Api::all_with(
            client::dynamic_client(&self.config, cluster_id)?,
            &clusternet_resource(kind, plural),
        ))
    }

    async fn find_clusternet_object(
        &self,
        cluster_id: &str,
        kind: &str,
        plural: &str,
        name: &str,
    ) -> Result<Option<DynamicObject>> {
        let api = self.clusternet_objects(cluster_id, kind, plural)?;
        let lp = ListParams::default().fields(&format!("metadata.name={}", name));
        let list = api.list(&lp).await?;
        Ok(list.items.into_iter().next())
    }

    async fn delete_clusternet_object(
        &self,
        cluster_id: &str,
        kind: &str,
        plural: &str,
        name: &str,
    ) -> Result<()> {
        // Absence short-circuits to a no-op
        let Some(found) = self
            .find_clusternet_object(cluster_id, kind, plural, name)
            .await?
        else {
            debug!(cluster = %cluster_id, kind = %kind, name = %name, "object already absent");
            return Ok(());
        };

        let api: Api<DynamicObject> = match found.metadata.namespace.as_deref() {
            Some(ns) => Api::namespaced_with(
                client::dynamic_client(&self.config, cluster_id)?,
                ns,
                &clusternet_resource(kind, plural),
            ),
            None => self.clusternet_objects(cluster_id, kind, plural)?,
        };
        match api.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
            Err(e) => Err(Error::from(e)),
        }
    }
}

#[async_trait]
impl HostClusterApi for GatewayHostClient {
    async fn get_namespace(&self, cluster_id: &str, name: &str) -> Result<Option<Namespace>> {
        ok_if_not_found(self.namespaces(cluster_id)?.get(name).await)
    }

    async fn create_namespace(&self, cluster_id: &str, namespace: &Namespace) -> Result<()> {
        self.namespaces(cluster_id)?
            .create(&PostParams::default(), namespace)
            .await?;
        Ok(())
    }

    async fn ensure_namespace(&self, cluster_id: &str, name: &str) -> Result<()> {
        let namespace = Namespace {
            metadata: kube::api::ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        ok_if_already_exists(
            self.namespaces(cluster_id)?
                .create(&PostParams::default(), &namespace)
                .await
                .map(|_| ()),
        )
    }

    async fn merge_namespace_annotations(
        &self,
        cluster_id: &str,
        name: &str,
        annotations: &BTreeMap<String, String>,
    ) -> Result<()> {
        let api = self.namespaces(cluster_id)?;
        let current = api.get(name).await?;

        let mut merged = current.metadata.annotations.unwrap_or_default();
        merged.extend(annotations.iter().map(|(k, v)| (k.clone(), v.clone())));

        let patch = serde_json::json!({ "metadata": { "annotations": merged } });
        api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn get_secret(
        &self,
        cluster_id: &str,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Secret>> {
        ok_if_not_found(self.secrets(cluster_id, namespace)?.get(name).await)
    }

    async fn list_secrets(&self, cluster_id: &str, namespace: &str) -> Result<Vec<Secret>> {
        let list = self
            .secrets(cluster_id, namespace)?
            .list(&ListParams::default())
            .await?;
        Ok(list.items)
    }

    async fn create_secret(&self, cluster_id: &str, secret: &Secret) -> Result<()> {
        let namespace = secret
            .metadata
            .namespace
            .as_deref()
            .ok_or_else(|| Error::internal_with_context("gateway", "secret has no namespace"))?;
        self.secrets(cluster_id, namespace)?
            .create(&PostParams::default(), secret)
            .await?;
        Ok(())
    }

    async fn get_service_loadbalancer_ip(
        &self,
        cluster_id: &str,
        namespace: &str,
        name: &str,
    ) -> Result<Option<String>> {
        let Some(service) =
            ok_if_not_found(self.services(cluster_id, namespace)?.get(name).await)?
        else {
            return Ok(None);
        };

        let ip = service
            .status
            .and_then(|s| s.load_balancer)
            .and_then(|lb| lb.ingress)
            .and_then(|ingress| ingress.into_iter().find_map(|i| i.ip));
        Ok(ip)
    }

    async fn check_api_address(&self, address: &str) -> Result<bool> {
        let probe = client::address_client(&self.config, address)?;
        match probe.apiserver_version().await {
            Ok(version) => {
                debug!(address = %address, version = %version.git_version, "API server reachable");
                Ok(true)
            }
            Err(e) => {
                debug!(address = %address, error = %e, "API server not serving yet");
                Ok(false)
            }
        }
    }

    async fn list_quotas(
        &self,
        cluster_id: &str,
        namespace: &str,
    ) -> Result<Vec<MultiClusterResourceQuota>> {
        let list = self
            .quotas(cluster_id, namespace)?
            .list(&ListParams::default())
            .await?;
        Ok(list.items)
    }

    async fn get_quota(
        &self,
        cluster_id: &str,
        namespace: &str,
        name: &str,
    ) -> Result<Option<MultiClusterResourceQuota>> {
        ok_if_not_found(self.quotas(cluster_id, namespace)?.get(name).await)
    }

    async fn create_quota(
        &self,
        cluster_id: &str,
        quota: &MultiClusterResourceQuota,
    ) -> Result<()> {
        let namespace = quota
            .metadata
            .namespace
            .as_deref()
            .ok_or_else(|| Error::internal_with_context("gateway", "quota has no namespace"))?;
        self.quotas(cluster_id, namespace)?
            .create(&PostParams::default(), quota)
            .await?;
        Ok(())
    }

    async fn update_quota(
        &self,
        cluster_id: &str,
        quota: &MultiClusterResourceQuota,
    ) -> Result<()> {
        let namespace = quota
            .metadata
            .namespace
            .as_deref()
            .ok_or_else(|| Error::internal_with_context("gateway", "quota has no namespace"))?;
        let name = quota
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| Error::internal_with_context("gateway", "quota has no name"))?;

        let patch = serde_json::json!({ "spec": quota.spec });
        self.quotas(cluster_id, namespace)?
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn delete_quota(&self, cluster_id: &str, namespace: &str, name: &str) -> Result<()> {
        match self
            .quotas(cluster_id, namespace)?
            .delete(name, &DeleteParams::default())
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Ok(()),
            Err(e) => Err(Error::from(e)),
        }
    }

    async fn get_managed_cluster(
        &self,
        cluster_id: &str,
        name: &str,
    ) -> Result<Option<DynamicObject>> {
        self.find_clusternet_object(cluster_id, "ManagedCluster", "managedclusters", name)
            .await
    }

    async fn delete_managed_cluster(&self, cluster_id: &str, name: &str) -> Result<()> {
        self.delete_clusternet_object(cluster_id, "ManagedCluster", "managedclusters", name)
            .await
    }

    async fn get_cluster_registration_request(
        &self,
        cluster_id: &str,
        name: &str,
    ) -> Result<Option<DynamicObject>> {
        self.find_clusternet_object(
            cluster_id,
            "ClusterRegistrationRequest",
            "clusterregistrationrequests",
            name,
        )
        .await
    }

    async fn delete_cluster_registration_request(
        &self,
        cluster_id: &str,
        name: &str,
    ) -> Result<()> {
        self.delete_clusternet_object(
            cluster_id,
            "ClusterRegistrationRequest",
            "clusterregistrationrequests",
            name,
        )
        .await
    }
}
