//! Federation cluster store.
//!
//! Persists federation-cluster metadata independent of the underlying
//! Kubernetes objects. Exactly one record exists per federation cluster
//! ID; status transitions are driven only by the installation pipeline
//! and its failure callback.

use async_trait::async_trait;
use dashmap::DashMap;

use fedlink_common::types::{FederationCluster, FederationClusterStatus};
use fedlink_common::{Error, Result};

/// Persistence seam for [`FederationCluster`] records.
#[async_trait]
pub trait FederationClusterStore: Send + Sync {
    /// Create a record; a record with the same federation cluster ID must
    /// not already exist
    async fn create(&self, record: &FederationCluster) -> Result<()>;

    /// Fetch a record, `None` if it does not exist
    async fn get(&self, federation_cluster_id: &str) -> Result<Option<FederationCluster>>;

    /// Replace an existing record
    async fn update(&self, record: &FederationCluster) -> Result<()>;

    /// Transition a record's status, returning the updated record
    async fn update_status(
        &self,
        federation_cluster_id: &str,
        status: FederationClusterStatus,
    ) -> Result<FederationCluster>;

    /// All records, including soft-deleted ones
    async fn list(&self) -> Result<Vec<FederationCluster>>;
}

/// In-memory [`FederationClusterStore`].
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<String, FederationCluster>,
}

#[async_trait]
impl FederationClusterStore for MemoryStore {
    async fn create(&self, record: &FederationCluster) -> Result<()> {
        let id = record.federation_cluster_id.clone();
        if self.records.contains_key(&id) {
            return Err(Error::store(id, "record already exists"));
        }
        self.records.insert(id, record.clone());
        Ok(())
    }

    async fn get(&self, federation_cluster_id: &str) -> Result<Option<FederationCluster>> {
        Ok(self.records.get(federation_cluster_id).map(|r| r.clone()))
    }

    async fn update(&self, record: &FederationCluster) -> Result<()> {
        let id = record.federation_cluster_id.clone();
        match self.records.get_mut(&id) {
            Some(mut existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(Error::store(id, "record not found")),
        }
    }

    async fn update_status(
        &self,
        federation_cluster_id: &str,
        status: FederationClusterStatus,
    ) -> Result<FederationCluster> {
        match self.records.get_mut(federation_cluster_id) {
            Some(mut record) => {
                record.status = status;
                Ok(record.clone())
            }
            None => Err(Error::store(federation_cluster_id, "record not found")),
        }
    }

    async fn list(&self) -> Result<Vec<FederationCluster>> {
        Ok(self.records.iter().map(|r| r.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> FederationCluster {
        FederationCluster {
            host_cluster_id: "cm-host-1".into(),
            federation_cluster_id: id.into(),
            federation_cluster_name: "prod-federation".into(),
            project_id: "p-1".into(),
            project_code: "proj-a".into(),
            creator: "admin".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_one_record_per_federation_cluster_id() {
        let store = MemoryStore::default();
        store.create(&record("cm-fed-1")).await.unwrap();

        let err = store.create(&record("cm-fed-1")).await.unwrap_err();
        assert!(err.to_string().contains("cm-fed-1"));
    }

    #[tokio::test]
    async fn test_status_transition() {
        let store = MemoryStore::default();
        store.create(&record("cm-fed-1")).await.unwrap();
        assert_eq!(
            store.get("cm-fed-1").await.unwrap().unwrap().status,
            FederationClusterStatus::Creating
        );

        let updated = store
            .update_status("cm-fed-1", FederationClusterStatus::Running)
            .await
            .unwrap();
        assert_eq!(updated.status, FederationClusterStatus::Running);
    }

    #[tokio::test]
    async fn test_update_of_missing_record_fails() {
        let store = MemoryStore::default();
        assert!(store.get("cm-fed-9").await.unwrap().is_none());
        assert!(store.update(&record("cm-fed-9")).await.is_err());
        assert!(store
            .update_status("cm-fed-9", FederationClusterStatus::Deleted)
            .await
            .is_err());
    }
}
