//! The JSON-encoded sync request carried in the task parameter bag.

use serde::{Deserialize, Serialize};

use fedlink_common::params::PARAM_SYNC_REQUEST;
use fedlink_common::{Error, Result};

/// Request to reconcile one federated namespace.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    /// Host cluster the namespace lives on
    pub host_cluster_id: String,
    /// Namespace to reconcile
    pub namespace: String,
}

impl SyncRequest {
    /// Parse a request from its JSON encoding.
    ///
    /// Malformed input is a fatal parameter error; retrying cannot fix it.
    pub fn parse(raw: &str) -> Result<Self> {
        let req: Self = serde_json::from_str(raw)
            .map_err(|e| Error::parameter(PARAM_SYNC_REQUEST, format!("is not valid JSON: {}", e)))?;
        if req.host_cluster_id.is_empty() {
            return Err(Error::parameter(PARAM_SYNC_REQUEST, "has empty hostClusterId"));
        }
        if req.namespace.is_empty() {
            return Err(Error::parameter(PARAM_SYNC_REQUEST, "has empty namespace"));
        }
        Ok(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_request_parses() {
        let req =
            SyncRequest::parse(r#"{"hostClusterId":"cm-host-1","namespace":"workloads"}"#).unwrap();
        assert_eq!(req.host_cluster_id, "cm-host-1");
        assert_eq!(req.namespace, "workloads");
    }

    #[test]
    fn test_malformed_json_is_fatal() {
        let err = SyncRequest::parse("{not json").unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn test_empty_fields_are_fatal() {
        let err = SyncRequest::parse(r#"{"hostClusterId":"","namespace":"ns"}"#).unwrap_err();
        assert!(!err.is_retryable());
        let err = SyncRequest::parse(r#"{"hostClusterId":"cm-host-1","namespace":""}"#).unwrap_err();
        assert!(!err.is_retryable());
    }
}
