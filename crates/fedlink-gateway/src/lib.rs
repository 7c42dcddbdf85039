//! Cluster Gateway Client
//!
//! Unifies three transports to reach any cluster by ID: an RPC client to
//! the central cluster registry/manager, a native per-cluster Kubernetes
//! client reached through a path-based gateway, and a dynamic
//! (schema-less) client for custom resource types.
//!
//! All per-cluster clients are stateless and re-created per call. There is
//! no connection pool and no cached client keyed by cluster ID; this trades
//! per-call setup cost for simplicity and eliminates stale-credential bugs.

#![deny(missing_docs)]

mod client;
pub mod config;
pub mod host;
pub mod manager;
pub mod memory;

pub use config::GatewayConfig;
pub use host::{GatewayHostClient, HostClusterApi};
pub use manager::{
    ClusterEntry, ClusterManagerClient, ClusterManagerTransport, CreateClusterRequest,
    RegistryClusterStatus, RpcEnvelope,
};
