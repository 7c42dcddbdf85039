//! Quota conversion for the scheduler backends.
//!
//! The schedulers speak string quantities, not Kubernetes `Quantity`
//! values, and each only receives the quota objects annotated as
//! belonging to it.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::{Deserialize, Serialize};

use fedlink_common::keys;
use fedlink_common::quota::MultiClusterResourceQuota;

/// One quota object flattened into scheduler-native form.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuotaLine {
    /// Quota object name
    pub name: String,
    /// Resource-name to string-quantity hard limits
    #[serde(default)]
    pub hard: BTreeMap<String, String>,
    /// Taiji sub-cluster location, if annotated on the quota object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Convert a hard-limit map to backend-native string quantities.
pub fn hard_to_strings(hard: &BTreeMap<String, Quantity>) -> BTreeMap<String, String> {
    hard.iter().map(|(k, v)| (k.clone(), v.0.clone())).collect()
}

/// Flatten the quota objects routed to `routing_key` into quota lines.
///
/// Quotas without the routing annotation are dropped; the remaining
/// backends see their own filtered view of the same namespace.
pub fn quota_lines_for_backend(
    quotas: &[MultiClusterResourceQuota],
    routing_key: &str,
) -> Vec<QuotaLine> {
    quotas
        .iter()
        .filter(|q| q.routes_to(routing_key))
        .map(|q| QuotaLine {
            name: q.metadata.name.clone().unwrap_or_default(),
            hard: hard_to_strings(&q.hard()),
            location: q
                .metadata
                .annotations
                .as_ref()
                .and_then(|a| a.get(keys::ANNO_TAIJI_LOCATION))
                .cloned(),
        })
        .collect()
}
