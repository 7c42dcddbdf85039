//! The reconcile seam every backend implements.

use async_trait::async_trait;

use fedlink_common::Result;

use crate::classify::SubClusterKind;
use crate::state::NamespaceState;

/// Per-kind quota reconciliation against one sub-cluster.
///
/// Implementations are idempotent: calling `create_or_update` twice with
/// the same state leaves the target in the same condition as calling it
/// once. The driving step owns retry policy.
#[async_trait]
pub trait ReconcileBackend: Send + Sync {
    /// The sub-cluster kind this backend serves
    fn kind(&self) -> SubClusterKind;

    /// Whether the namespace already exists on (or is registered with)
    /// the target backend for this sub-cluster
    async fn exists(&self, state: &NamespaceState, sub_cluster_id: &str) -> Result<bool>;

    /// Create the namespace/quota on the backend, or update it in place
    async fn create_or_update(&self, state: &NamespaceState, sub_cluster_id: &str) -> Result<()>;
}
