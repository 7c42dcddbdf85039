//! Sub-cluster quota backends.
//!
//! A federated namespace fans out to up to four quota-enforcement systems,
//! one per sub-cluster kind: plain Kubernetes namespaces (Normal), the
//! annotation-driven Hunbu mixer clusters, and the Taiji and Suanli RPC
//! schedulers. Each backend implements [`ReconcileBackend`] and is
//! dispatched on a [`SubClusterKind`] derived once from the sub-cluster's
//! managed-cluster routing labels.
//!
//! The scheduler client performs no retries of its own; retry policy
//! belongs to the reconciliation step driving it.

#![deny(missing_docs)]

pub mod backend;
pub mod classify;
pub mod convert;
pub mod hunbu;
pub mod memory;
pub mod normal;
pub mod scheduler;
pub mod state;
pub mod suanli;
pub mod taiji;

pub use backend::ReconcileBackend;
pub use classify::SubClusterKind;
pub use scheduler::{
    KubeconfigInfo, ModuleInfo, NamespaceQuotaRequest, RegistrationState, SchedulerBackend,
    SchedulerClient, SchedulerResponse, SchedulerTransport,
};
pub use state::NamespaceState;
