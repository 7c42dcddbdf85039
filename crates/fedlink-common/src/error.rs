//! Error types for fedlink operations
//!
//! Errors are structured with fields to aid debugging in production.
//! Each error variant carries contextual information (cluster IDs,
//! namespaces, upstream messages) so a failed step can be diagnosed
//! without re-deriving state.

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for fedlink operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// A required task parameter is missing or unusable
    ///
    /// Always fatal: retrying cannot produce the missing value.
    #[error("parameter error: required parameter '{name}' {message}")]
    Parameter {
        /// Name of the missing/invalid parameter
        name: String,
        /// What is wrong with it
        message: String,
    },

    /// Network/TLS failure reaching a registry, cluster, or backend
    #[error("transport error reaching {target}: {message}")]
    Transport {
        /// The system we failed to reach (registry, cluster ID, backend name)
        target: String,
        /// Description of the failure
        message: String,
    },

    /// A well-formed RPC response whose embedded result/code signals failure
    #[error("application error from {target} (code {code}): {message}")]
    Application {
        /// The system that rejected the call
        target: String,
        /// The upstream error code (0 is never an error)
        code: i32,
        /// The upstream error message, embedded verbatim
        message: String,
    },

    /// A precondition for the operation does not hold
    ///
    /// Not retryable: the world must change before the operation can run
    /// (e.g. federation components already installed on the host).
    #[error("precondition failed: {message}")]
    Precondition {
        /// Description of the violated precondition
        message: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },

    /// Federation cluster store error
    #[error("store error for {federation_cluster_id}: {message}")]
    Store {
        /// Federation cluster ID of the affected record
        federation_cluster_id: String,
        /// Description of what failed
        message: String,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred (e.g., "install", "reconciler")
        context: String,
    },
}

impl Error {
    /// Create a parameter error for a missing required parameter
    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::Parameter {
            name: name.into(),
            message: "is missing".to_string(),
        }
    }

    /// Create a parameter error with a custom message
    pub fn parameter(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Parameter {
            name: name.into(),
            message: msg.into(),
        }
    }

    /// Create a transport error for the given target
    pub fn transport(target: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Transport {
            target: target.into(),
            message: msg.into(),
        }
    }

    /// Create an application error embedding the upstream code and message
    pub fn application(target: impl Into<String>, code: i32, msg: impl Into<String>) -> Self {
        Self::Application {
            target: target.into(),
            code,
            message: msg.into(),
        }
    }

    /// Create a precondition error
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition {
            message: msg.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with resource kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create a store error for the given federation cluster
    pub fn store(federation_cluster_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Store {
            federation_cluster_id: federation_cluster_id.into(),
            message: msg.into(),
        }
    }

    /// Create an internal error with the given message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: UNKNOWN_CONTEXT.to_string(),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Check if this error is retryable
    ///
    /// Parameter, precondition, and serialization errors are not retryable:
    /// the input must change first. Transport and application errors are
    /// retryable since the target systems are occasionally unavailable.
    /// Kubernetes errors depend on the status code.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => {
                // Retry on transient K8s errors (connection, timeout).
                // Don't retry on 4xx (validation, not found, conflict handled by caller).
                !matches!(
                    source,
                    kube::Error::Api(ae) if (400..500).contains(&ae.code)
                )
            }
            Error::Parameter { .. } => false,
            Error::Transport { .. } => true,
            Error::Application { .. } => true,
            Error::Precondition { .. } => false,
            Error::Serialization { .. } => false,
            Error::Store { .. } => true,
            Error::Internal { .. } => true,
        }
    }

    /// Get the target system if this error names one
    pub fn target(&self) -> Option<&str> {
        match self {
            Error::Transport { target, .. } => Some(target),
            Error::Application { target, .. } => Some(target),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // Story Tests: Error Propagation Through the Pipelines
    // ==========================================================================

    /// Story: a step with a missing required parameter fails fatally
    ///
    /// Retrying a step cannot conjure up a parameter that was never written
    /// to the task, so parameter errors must never be retried.
    #[test]
    fn story_missing_parameter_is_fatal() {
        let err = Error::missing_parameter("federation-cluster-id");
        assert!(err.to_string().contains("federation-cluster-id"));
        assert!(!err.is_retryable());

        let err = Error::parameter("request", "is not valid JSON");
        assert!(err.to_string().contains("not valid JSON"));
        assert!(!err.is_retryable());
    }

    /// Story: transport failures to external systems are retried
    #[test]
    fn story_transport_errors_are_retryable() {
        let err = Error::transport("taiji", "connection refused");
        assert!(err.is_retryable());
        assert_eq!(err.target(), Some("taiji"));
        assert!(err.to_string().contains("connection refused"));
    }

    /// Story: application-level rejections embed the upstream message
    ///
    /// A well-formed response with a failure code is treated like a
    /// transport error for retry purposes, but carries a richer message.
    #[test]
    fn story_application_errors_embed_upstream_message() {
        let err = Error::application("cluster-manager", 42, "project quota exceeded");
        assert!(err.is_retryable());
        assert!(err.to_string().contains("code 42"));
        assert!(err.to_string().contains("project quota exceeded"));
        assert_eq!(err.target(), Some("cluster-manager"));
    }

    /// Story: double-installation is refused, not retried
    #[test]
    fn story_precondition_failures_are_not_retried() {
        let err = Error::precondition("federation components already installed on cm-host-1");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("cm-host-1"));
    }

    /// Story: malformed input fails the pipeline without retries
    #[test]
    fn story_serialization_errors_are_not_retried() {
        let err = Error::serialization("unexpected end of JSON input");
        assert!(!err.is_retryable());

        let err = Error::serialization_for_kind("MultiClusterResourceQuota", "missing spec");
        match &err {
            Error::Serialization { kind, .. } => {
                assert_eq!(kind.as_deref(), Some("MultiClusterResourceQuota"));
            }
            _ => panic!("expected Serialization variant"),
        }
    }

    #[test]
    fn test_store_error_carries_record_id() {
        let err = Error::store("fed-1", "record not found");
        assert!(err.to_string().contains("fed-1"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_internal_error_contexts() {
        let err = Error::internal("unexpected state");
        assert!(err.to_string().contains(format!("[{}]", UNKNOWN_CONTEXT).as_str()));

        let err = Error::internal_with_context("install", "unexpected state");
        assert!(err.to_string().contains("[install]"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_kube_4xx_is_not_retryable() {
        let ae = kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "namespaces \"ns\" not found".to_string(),
            reason: "NotFound".to_string(),
            code: 404,
        };
        let err = Error::from(kube::Error::Api(ae));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_kube_5xx_is_retryable() {
        let ae = kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "etcdserver: request timed out".to_string(),
            reason: "InternalError".to_string(),
            code: 500,
        };
        let err = Error::from(kube::Error::Api(ae));
        assert!(err.is_retryable());
    }
}
