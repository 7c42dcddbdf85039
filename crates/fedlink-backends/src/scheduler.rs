//! RPC client for the Taiji and Suanli scheduling systems.
//!
//! Every call carries a bounded one-minute timeout and is not retried
//! here; retry is the reconciliation step's responsibility. Responses
//! carry an embedded code whose sentinel value means success; any other
//! code surfaces as an application error embedding the upstream message.
//!
//! "Not registered yet" is detected by substring-matching the upstream
//! message. That is fragile to wording changes and a known debt item;
//! the match is isolated in [`is_not_registered`] so a structured status
//! field can replace it if the backends ever expose one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use fedlink_common::{Error, Result};

use crate::convert::QuotaLine;

/// Response code the schedulers use for success
pub const SUCCESS_CODE: i32 = 0;

/// Marker substring in the upstream message when a namespace has not been
/// registered with the scheduler yet
const NOT_REGISTERED_MARKER: &str = "namespace not register";

/// Whether an upstream failure message means "not registered yet".
pub fn is_not_registered(message: &str) -> bool {
    message.contains(NOT_REGISTERED_MARKER)
}

/// The two RPC-backed scheduling systems.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub enum SchedulerBackend {
    /// The Taiji scheduler
    Taiji,
    /// The Suanli scheduler
    Suanli,
}

impl SchedulerBackend {
    /// Name used as the error target and in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Taiji => "taiji",
            Self::Suanli => "suanli",
        }
    }
}

impl std::fmt::Display for SchedulerBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduler response envelope. `code == 0` is success.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SchedulerResponse<T> {
    /// Embedded result code, [`SUCCESS_CODE`] on success
    pub code: i32,
    /// Upstream message (failure detail or informational)
    #[serde(default)]
    pub message: String,
    /// Payload when the call succeeded
    #[serde(default = "none_data", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

fn none_data<T>() -> Option<T> {
    None
}

impl<T> SchedulerResponse<T> {
    /// A successful response carrying `data`
    pub fn ok(data: T) -> Self {
        Self {
            code: SUCCESS_CODE,
            message: String::new(),
            data: Some(data),
        }
    }

    /// A successful response with no payload
    pub fn ok_empty() -> Self {
        Self {
            code: SUCCESS_CODE,
            message: String::new(),
            data: None,
        }
    }

    /// A failed response with an upstream code and message
    pub fn failed(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// Create-or-update request for a namespace's quota on a scheduler.
///
/// The same shape serves both create and update; the scheduler keys on
/// the namespace name. Taiji requires the location and billing fields,
/// Suanli ignores them.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceQuotaRequest {
    /// Namespace to register or update
    pub namespace: String,
    /// Sub-cluster the namespace lands on
    pub sub_cluster_id: String,
    /// Taiji sub-cluster location (from the per-quota annotation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Billing business ID (Taiji)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bk_biz_id: Option<String>,
    /// Billing module ID (Taiji)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bk_module_id: Option<String>,
    /// Quota line items routed to this scheduler
    #[serde(default)]
    pub quotas: Vec<QuotaLine>,
}

/// Kubeconfig material returned for a registered namespace.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KubeconfigInfo {
    /// Serialized kubeconfig granting access to the scheduler-side view
    pub kubeconfig: String,
}

/// Request to create a billing module for a namespace (Taiji only).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateModuleRequest {
    /// Namespace the module bills for
    pub namespace: String,
    /// Project code owning the namespace
    pub project_code: String,
}

/// Billing identifiers returned by module creation.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    /// Billing business ID
    pub bk_biz_id: String,
    /// Billing module ID
    pub bk_module_id: String,
}

/// Registration state of a namespace with a scheduler.
#[derive(Clone, Debug, PartialEq)]
pub enum RegistrationState {
    /// The namespace is registered; kubeconfig material is available
    Registered(KubeconfigInfo),
    /// The namespace has not been registered yet
    NotRegistered,
}

/// Raw transport to the schedulers. The wire layer (gRPC plus service
/// discovery) is supplied by the embedding binary.
#[async_trait]
pub trait SchedulerTransport: Send + Sync {
    /// Register a namespace with its quota on a scheduler
    async fn create_namespace_quota(
        &self,
        backend: SchedulerBackend,
        req: &NamespaceQuotaRequest,
    ) -> Result<SchedulerResponse<()>>;

    /// Update an already-registered namespace's quota
    async fn update_namespace_quota(
        &self,
        backend: SchedulerBackend,
        req: &NamespaceQuotaRequest,
    ) -> Result<SchedulerResponse<()>>;

    /// Fetch the kubeconfig of a registered namespace
    async fn get_kubeconfig(
        &self,
        backend: SchedulerBackend,
        namespace: &str,
    ) -> Result<SchedulerResponse<KubeconfigInfo>>;

    /// Create a billing module (Taiji)
    async fn create_module(
        &self,
        req: &CreateModuleRequest,
    ) -> Result<SchedulerResponse<ModuleInfo>>;
}

/// Client enforcing the call timeout and envelope discipline over a
/// [`SchedulerTransport`].
#[derive(Clone)]
pub struct SchedulerClient {
    transport: Arc<dyn SchedulerTransport>,
    call_timeout: Duration,
}

impl SchedulerClient {
    /// Wrap a transport with the default one-minute call timeout
    pub fn new(transport: Arc<dyn SchedulerTransport>) -> Self {
        Self {
            transport,
            call_timeout: Duration::from_secs(60),
        }
    }

    /// Override the call timeout
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Register a namespace with its quota
    pub async fn create_namespace_quota(
        &self,
        backend: SchedulerBackend,
        req: &NamespaceQuotaRequest,
    ) -> Result<()> {
        debug!(backend = %backend, namespace = %req.namespace, "creating namespace quota");
        let resp = self
            .bounded(
                backend.as_str(),
                "create namespace quota",
                self.transport.create_namespace_quota(backend, req),
            )
            .await?;
        require_success(backend, "create namespace quota", resp).map(|_| ())
    }

    /// Update an already-registered namespace's quota
    pub async fn update_namespace_quota(
        &self,
        backend: SchedulerBackend,
        req: &NamespaceQuotaRequest,
    ) -> Result<()> {
        debug!(backend = %backend, namespace = %req.namespace, "updating namespace quota");
        let resp = self
            .bounded(
                backend.as_str(),
                "update namespace quota",
                self.transport.update_namespace_quota(backend, req),
            )
            .await?;
        require_success(backend, "update namespace quota", resp).map(|_| ())
    }

    /// Probe whether a namespace is registered with a scheduler.
    ///
    /// A "not registered" failure message routes to
    /// [`RegistrationState::NotRegistered`]; any other failure is an error.
    pub async fn registration_state(
        &self,
        backend: SchedulerBackend,
        namespace: &str,
    ) -> Result<RegistrationState> {
        let resp = self
            .bounded(
                backend.as_str(),
                "get kubeconfig",
                self.transport.get_kubeconfig(backend, namespace),
            )
            .await?;

        if resp.code == SUCCESS_CODE {
            let info = resp.data.ok_or_else(|| {
                Error::application(
                    backend.as_str(),
                    SUCCESS_CODE,
                    format!("get kubeconfig for {}: empty response data", namespace),
                )
            })?;
            return Ok(RegistrationState::Registered(info));
        }
        if is_not_registered(&resp.message) {
            debug!(backend = %backend, namespace = %namespace, "namespace not registered yet");
            return Ok(RegistrationState::NotRegistered);
        }
        Err(Error::application(
            backend.as_str(),
            resp.code,
            format!("get kubeconfig for {}: {}", namespace, resp.message),
        ))
    }

    /// Create a billing module for a namespace (Taiji)
    pub async fn create_module(&self, req: &CreateModuleRequest) -> Result<ModuleInfo> {
        debug!(namespace = %req.namespace, "creating billing module");
        let backend = SchedulerBackend::Taiji;
        let resp = self
            .bounded(
                backend.as_str(),
                "create module",
                self.transport.create_module(req),
            )
            .await?;
        require_success(backend, "create module", resp)?.ok_or_else(|| {
            Error::application(
                backend.as_str(),
                SUCCESS_CODE,
                format!("create module for {}: empty response data", req.namespace),
            )
        })
    }

    async fn bounded<T, Fut>(&self, target: &str, op: &str, fut: Fut) -> Result<T>
    where
        Fut: std::future::Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(res) => res,
            Err(_) => Err(Error::transport(
                target,
                format!("{} timed out after {:?}", op, self.call_timeout),
            )),
        }
    }
}

/// Check the response code, surfacing failures with the upstream message.
fn require_success<T>(
    backend: SchedulerBackend,
    op: &str,
    resp: SchedulerResponse<T>,
) -> Result<Option<T>> {
    if resp.code != SUCCESS_CODE {
        return Err(Error::application(
            backend.as_str(),
            resp.code,
            format!("{}: {}", op, resp.message),
        ));
    }
    Ok(resp.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryScheduler;

    fn request(namespace: &str) -> NamespaceQuotaRequest {
        NamespaceQuotaRequest {
            namespace: namespace.to_string(),
            sub_cluster_id: "CM-SUB-1".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unregistered_namespace_routes_to_not_registered() {
        let client = SchedulerClient::new(Arc::new(InMemoryScheduler::default()));
        let state = client
            .registration_state(SchedulerBackend::Taiji, "workloads")
            .await
            .unwrap();
        assert_eq!(state, RegistrationState::NotRegistered);
    }

    #[tokio::test]
    async fn test_create_then_probe_is_registered() {
        let client = SchedulerClient::new(Arc::new(InMemoryScheduler::default()));
        client
            .create_namespace_quota(SchedulerBackend::Suanli, &request("workloads"))
            .await
            .unwrap();

        let state = client
            .registration_state(SchedulerBackend::Suanli, "workloads")
            .await
            .unwrap();
        assert!(matches!(state, RegistrationState::Registered(_)));

        // Registration is per backend
        let state = client
            .registration_state(SchedulerBackend::Taiji, "workloads")
            .await
            .unwrap();
        assert_eq!(state, RegistrationState::NotRegistered);
    }

    /// A non-success, non-marker failure is a hard application error.
    #[tokio::test]
    async fn test_other_failures_are_application_errors() {
        let scheduler = InMemoryScheduler::default();
        scheduler.fail_kubeconfig_with(7, "internal scheduler fault");
        let client = SchedulerClient::new(Arc::new(scheduler));

        let err = client
            .registration_state(SchedulerBackend::Taiji, "workloads")
            .await
            .unwrap_err();
        match &err {
            Error::Application { target, code, message } => {
                assert_eq!(target, "taiji");
                assert_eq!(*code, 7);
                assert!(message.contains("internal scheduler fault"));
            }
            other => panic!("expected Application error, got {:?}", other),
        }
    }

    /// Updating a namespace never registered fails with the marker message,
    /// which the caller would have avoided by probing first.
    #[tokio::test]
    async fn test_update_of_unregistered_namespace_fails() {
        let client = SchedulerClient::new(Arc::new(InMemoryScheduler::default()));
        let err = client
            .update_namespace_quota(SchedulerBackend::Taiji, &request("workloads"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("namespace not register"));
    }

    #[tokio::test]
    async fn test_slow_transport_hits_call_timeout() {
        struct SlowScheduler;

        #[async_trait]
        impl SchedulerTransport for SlowScheduler {
            async fn create_namespace_quota(
                &self,
                _backend: SchedulerBackend,
                _req: &NamespaceQuotaRequest,
            ) -> Result<SchedulerResponse<()>> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(SchedulerResponse::ok_empty())
            }

            async fn update_namespace_quota(
                &self,
                _backend: SchedulerBackend,
                _req: &NamespaceQuotaRequest,
            ) -> Result<SchedulerResponse<()>> {
                Ok(SchedulerResponse::ok_empty())
            }

            async fn get_kubeconfig(
                &self,
                _backend: SchedulerBackend,
                _namespace: &str,
            ) -> Result<SchedulerResponse<KubeconfigInfo>> {
                Ok(SchedulerResponse::ok(KubeconfigInfo::default()))
            }

            async fn create_module(
                &self,
                _req: &CreateModuleRequest,
            ) -> Result<SchedulerResponse<ModuleInfo>> {
                Ok(SchedulerResponse::ok(ModuleInfo::default()))
            }
        }

        let client = SchedulerClient::new(Arc::new(SlowScheduler))
            .with_call_timeout(Duration::from_millis(10));
        let err = client
            .create_namespace_quota(SchedulerBackend::Taiji, &request("workloads"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_not_registered_marker_matching() {
        assert!(is_not_registered("namespace not register in taiji cluster"));
        assert!(is_not_registered("error: namespace not registered"));
        assert!(!is_not_registered("permission denied"));
    }
}
