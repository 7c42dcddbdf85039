//! In-memory scheduler transport.
//!
//! Mirrors the Taiji/Suanli envelope behavior, including the
//! "namespace not register" failure message for unregistered namespaces.
//! Used by tests and local dry-runs.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;

use fedlink_common::Result;

use crate::scheduler::{
    CreateModuleRequest, KubeconfigInfo, ModuleInfo, NamespaceQuotaRequest, SchedulerBackend,
    SchedulerResponse, SchedulerTransport,
};

/// In-memory Taiji/Suanli scheduler.
#[derive(Default)]
pub struct InMemoryScheduler {
    registered: DashMap<(SchedulerBackend, String), KubeconfigInfo>,
    creates: Mutex<Vec<(SchedulerBackend, NamespaceQuotaRequest)>>,
    updates: Mutex<Vec<(SchedulerBackend, NamespaceQuotaRequest)>>,
    module_calls: AtomicU32,
    kubeconfig_fault: Mutex<Option<(i32, String)>>,
}

impl InMemoryScheduler {
    /// Pre-register a namespace so probes see it as registered
    pub fn register(&self, backend: SchedulerBackend, namespace: &str) {
        self.registered.insert(
            (backend, namespace.to_string()),
            KubeconfigInfo {
                kubeconfig: format!("kubeconfig-{}-{}", backend, namespace),
            },
        );
    }

    /// Force every kubeconfig probe to fail with the given code/message
    pub fn fail_kubeconfig_with(&self, code: i32, message: &str) {
        *self.kubeconfig_fault.lock().unwrap() = Some((code, message.to_string()));
    }

    /// Number of create-namespace-quota calls received
    pub fn create_count(&self) -> usize {
        self.creates.lock().unwrap().len()
    }

    /// Number of update-namespace-quota calls received
    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// Number of create-module calls received
    pub fn module_call_count(&self) -> u32 {
        self.module_calls.load(Ordering::SeqCst)
    }

    /// The last create request received, if any
    pub fn last_create(&self) -> Option<(SchedulerBackend, NamespaceQuotaRequest)> {
        self.creates.lock().unwrap().last().cloned()
    }

    /// The last update request received, if any
    pub fn last_update(&self) -> Option<(SchedulerBackend, NamespaceQuotaRequest)> {
        self.updates.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SchedulerTransport for InMemoryScheduler {
    async fn create_namespace_quota(
        &self,
        backend: SchedulerBackend,
        req: &NamespaceQuotaRequest,
    ) -> Result<SchedulerResponse<()>> {
        self.creates.lock().unwrap().push((backend, req.clone()));
        self.register(backend, &req.namespace);
        Ok(SchedulerResponse::ok_empty())
    }

    async fn update_namespace_quota(
        &self,
        backend: SchedulerBackend,
        req: &NamespaceQuotaRequest,
    ) -> Result<SchedulerResponse<()>> {
        if !self
            .registered
            .contains_key(&(backend, req.namespace.clone()))
        {
            return Ok(SchedulerResponse::failed(
                1,
                format!("namespace not register in {} cluster", backend),
            ));
        }
        self.updates.lock().unwrap().push((backend, req.clone()));
        Ok(SchedulerResponse::ok_empty())
    }

    async fn get_kubeconfig(
        &self,
        backend: SchedulerBackend,
        namespace: &str,
    ) -> Result<SchedulerResponse<KubeconfigInfo>> {
        if let Some((code, message)) = self.kubeconfig_fault.lock().unwrap().clone() {
            return Ok(SchedulerResponse::failed(code, message));
        }
        match self.registered.get(&(backend, namespace.to_string())) {
            Some(info) => Ok(SchedulerResponse::ok(info.clone())),
            None => Ok(SchedulerResponse::failed(
                1,
                format!("namespace not register in {} cluster", backend),
            )),
        }
    }

    async fn create_module(
        &self,
        _req: &CreateModuleRequest,
    ) -> Result<SchedulerResponse<ModuleInfo>> {
        let n = self.module_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SchedulerResponse::ok(ModuleInfo {
            bk_biz_id: "100123".to_string(),
            bk_module_id: format!("mod-{}", n),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_registers_the_namespace() {
        let scheduler = InMemoryScheduler::default();
        let req = NamespaceQuotaRequest {
            namespace: "workloads".into(),
            sub_cluster_id: "CM-SUB-1".into(),
            ..Default::default()
        };

        scheduler
            .create_namespace_quota(SchedulerBackend::Taiji, &req)
            .await
            .unwrap();
        let resp = scheduler
            .get_kubeconfig(SchedulerBackend::Taiji, "workloads")
            .await
            .unwrap();
        assert_eq!(resp.code, 0);
        assert!(resp.data.is_some());
    }

    #[tokio::test]
    async fn test_each_module_call_yields_a_fresh_id() {
        let scheduler = InMemoryScheduler::default();
        let req = CreateModuleRequest {
            namespace: "workloads".into(),
            project_code: "proj-a".into(),
        };

        let first = scheduler.create_module(&req).await.unwrap().data.unwrap();
        let second = scheduler.create_module(&req).await.unwrap().data.unwrap();
        assert_ne!(first.bk_module_id, second.bk_module_id);
        assert_eq!(scheduler.module_call_count(), 2);
    }
}
