//! Common types for fedlink: errors, retry, task parameters, and CRDs

#![deny(missing_docs)]

pub mod error;
pub mod keys;
pub mod params;
pub mod quota;
pub mod retry;
pub mod step;
pub mod telemetry;
pub mod types;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Namespace holding the host cluster's bootstrap-token secrets
pub const BOOTSTRAP_TOKEN_NAMESPACE: &str = "kube-system";

/// Kubernetes secret type for bootstrap tokens
pub const BOOTSTRAP_TOKEN_SECRET_TYPE: &str = "bootstrap.kubernetes.io/token";

/// Prefix of bootstrap-token secret names (`bootstrap-token-<token-id>`)
pub const BOOTSTRAP_TOKEN_SECRET_PREFIX: &str = "bootstrap-token-";
