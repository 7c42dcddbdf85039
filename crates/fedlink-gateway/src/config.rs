//! Gateway endpoint and credential configuration.

/// Where the cluster gateway lives and how to authenticate to it.
///
/// Per-cluster API paths embed the cluster ID under the gateway base URL:
/// `<base>/clusters/<cluster-id>`.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Gateway base URL (e.g. "https://gateway.example.com")
    pub base_url: String,
    /// Bearer credential presented on every call
    pub token: String,
}

impl GatewayConfig {
    /// Create a config for the given gateway and credential
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// The per-cluster API URL for `cluster_id`
    pub fn cluster_url(&self, cluster_id: &str) -> String {
        format!(
            "{}/clusters/{}",
            self.base_url.trim_end_matches('/'),
            cluster_id
        )
    }
}
