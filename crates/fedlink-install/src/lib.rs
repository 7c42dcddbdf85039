//! Federation control-plane installation.
//!
//! An ordered pipeline of idempotent steps provisions a clusternet-based
//! federation control plane on a host cluster: pre-register the federation
//! entry, mint a bootstrap token, guard against double-installation,
//! install the clusternet components and the unified API server, then
//! register the cluster as Running. Any step failure rolls the federation
//! record to CreateFailed through the failure callback.

#![deny(missing_docs)]

pub mod callback;
pub mod component;
pub mod context;
pub mod memory;
pub mod pipeline;
pub mod steps;
pub mod store;
pub mod token;

pub use callback::InstallFailureCallback;
pub use component::{ComponentInstaller, FederationComponent};
pub use context::InstallContext;
pub use pipeline::install_pipeline;
pub use store::{FederationClusterStore, MemoryStore};
