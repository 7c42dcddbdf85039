//! Namespace/quota sync pipeline.
//!
//! Triggered per namespace to reconcile declared quota into every
//! sub-cluster backend the namespace references: validate the request,
//! snapshot the namespace and its quota objects from the host cluster,
//! fan out per-backend reconciliation under bounded retry, then stamp the
//! host namespace with the sync status.
//!
//! There is no failure callback here; a failed run relies on the external
//! scheduler re-triggering the whole pipeline.

#![deny(missing_docs)]

pub mod context;
pub mod pipeline;
pub mod request;
pub mod steps;

pub use context::SyncContext;
pub use pipeline::sync_pipeline;
pub use request::SyncRequest;
