//! Per-call Kubernetes client construction.
//!
//! Clients are built fresh for every call and dropped afterwards; credential
//! changes take effect on the next call without any cache invalidation.

use fedlink_common::{Error, Result};

use crate::config::GatewayConfig;

/// Build a native client bound to `<base>/clusters/<cluster_id>`.
///
/// TLS verification stays enabled on this path.
pub(crate) fn native_client(cfg: &GatewayConfig, cluster_id: &str) -> Result<kube::Client> {
    build(cfg, &cfg.cluster_url(cluster_id), false)
}

/// Build a dynamic-path client bound to `<base>/clusters/<cluster_id>`.
///
/// TLS verification is disabled on the dynamic path. This is an explicit
/// insecure choice carried over from the deployed gateway topology.
pub(crate) fn dynamic_client(cfg: &GatewayConfig, cluster_id: &str) -> Result<kube::Client> {
    build(cfg, &cfg.cluster_url(cluster_id), true)
}

/// Build a client against a raw API server address (used to probe the
/// unified API server before registration).
pub(crate) fn address_client(cfg: &GatewayConfig, address: &str) -> Result<kube::Client> {
    build(cfg, address, true)
}

fn build(cfg: &GatewayConfig, url: &str, accept_invalid_certs: bool) -> Result<kube::Client> {
    let uri: http::Uri = url
        .parse()
        .map_err(|e| Error::transport(url, format!("invalid cluster URL: {}", e)))?;

    let mut config = kube::Config::new(uri);
    config.default_namespace = "default".to_string();
    config.accept_invalid_certs = accept_invalid_certs;
    config.auth_info.token = Some(cfg.token.clone().into());

    kube::Client::try_from(config).map_err(Error::from)
}
