//! Label and annotation keys shared between the host cluster, sub-clusters,
//! and the cluster registry.
//!
//! Namespace and cluster annotations are the de-facto wire protocol between
//! the federation control plane and the backends; every key used anywhere in
//! the workspace is defined here.

// ---------------------------------------------------------------------------
// Cluster registry labels
// ---------------------------------------------------------------------------

/// Marks the federation (proxy) cluster entry in the registry
pub const LABEL_IS_FED_CLUSTER: &str = "federation.bkbcs.tencent.com/is-fed-cluster";

/// Marks the host cluster entry in the registry
pub const LABEL_IS_HOST_CLUSTER: &str = "federation.bkbcs.tencent.com/is-host-cluster";

/// Marks a sub-cluster entry in the registry
pub const LABEL_IS_SUB_CLUSTER: &str = "federation.bkbcs.tencent.com/is-sub-cluster";

/// Binds a cluster entry back to the installation task that created it
pub const LABEL_TASK_ID: &str = "federation.bkbcs.tencent.com/taskid";

/// Canonical truthy label/annotation value
pub const VALUE_TRUE: &str = "true";

// ---------------------------------------------------------------------------
// Federated namespace annotations (host cluster)
// ---------------------------------------------------------------------------

/// Gates a host namespace into the federation (`"true"` to include)
pub const ANNO_IS_FEDERATED_NAMESPACE: &str =
    "federation.bkbcs.tencent.com/is-federated-namespace";

/// Comma-separated sub-cluster IDs the namespace spans (upper-cased on read)
pub const ANNO_CLUSTER_RANGE: &str = "federation.bkbcs.tencent.com/cluster-range";

/// Project code owning the namespace
pub const ANNO_PROJECT_CODE: &str = "federation.bkbcs.tencent.com/project-code";

/// Task ID of the sync run that last touched the namespace
pub const ANNO_TASK_ID: &str = "federation.bkbcs.tencent.com/taskid";

/// Sync status bookkeeping (`success` after a completed run)
pub const ANNO_SYNC_STATUS: &str = "federation.bkbcs.tencent.com/status";

/// RFC 3339 timestamp of the last sync status update
pub const ANNO_SYNC_UPDATE_TIME: &str = "federation.bkbcs.tencent.com/update-time";

/// Value written to [`ANNO_SYNC_STATUS`] on success
pub const SYNC_STATUS_SUCCESS: &str = "success";

// ---------------------------------------------------------------------------
// Backend routing (managed-cluster labels and quota annotations)
// ---------------------------------------------------------------------------

/// Managed-cluster label routing a sub-cluster to the Taiji backend
pub const LABEL_SCHEDULER_TAIJI: &str = "federation.bkbcs.tencent.com/taiji";

/// Managed-cluster label routing a sub-cluster to the Suanli backend
pub const LABEL_SCHEDULER_SUANLI: &str = "federation.bkbcs.tencent.com/suanli";

/// Managed-cluster label routing a sub-cluster to the Hunbu backend
pub const LABEL_SCHEDULER_HUNBU: &str = "federation.bkbcs.tencent.com/hunbu";

/// Quota annotation marking a quota line as belonging to Taiji
pub const ANNO_QUOTA_TAIJI: &str = "quota.federation.bkbcs.tencent.com/taiji";

/// Quota annotation marking a quota line as belonging to Suanli
pub const ANNO_QUOTA_SUANLI: &str = "quota.federation.bkbcs.tencent.com/suanli";

/// Quota annotation marking a quota line as belonging to Hunbu
pub const ANNO_QUOTA_HUNBU: &str = "quota.federation.bkbcs.tencent.com/hunbu";

// ---------------------------------------------------------------------------
// Taiji backend annotations
// ---------------------------------------------------------------------------

/// Per-quota annotation naming the Taiji sub-cluster location
pub const ANNO_TAIJI_LOCATION: &str = "taiji.federation.bkbcs.tencent.com/sub-cluster-location";

/// Billing business ID persisted on the host namespace after module creation
pub const ANNO_TAIJI_BK_BIZ_ID: &str = "taiji.federation.bkbcs.tencent.com/bk-biz-id";

/// Billing module ID persisted on the host namespace after module creation
pub const ANNO_TAIJI_BK_MODULE_ID: &str = "taiji.federation.bkbcs.tencent.com/bk-module-id";

// ---------------------------------------------------------------------------
// Suanli backend annotations
// ---------------------------------------------------------------------------

/// Host-namespace annotation naming the platform Suanli quota is installed for
pub const ANNO_SUANLI_PLATFORM: &str = "suanli.federation.bkbcs.tencent.com/installed-platform";

// ---------------------------------------------------------------------------
// Hunbu backend: managed-cluster labels read, sub-cluster annotations written
// ---------------------------------------------------------------------------

/// Managed-cluster label: mixer-cluster membership
pub const LABEL_HUNBU_MIXER_CLUSTER: &str = "hunbu.federation.bkbcs.tencent.com/mixer-cluster";

/// Managed-cluster label: network mode
pub const LABEL_HUNBU_NETWORK_MODE: &str = "hunbu.federation.bkbcs.tencent.com/network-mode";

/// Managed-cluster label: preemption policy
pub const LABEL_HUNBU_PREEMPTION_POLICY: &str =
    "hunbu.federation.bkbcs.tencent.com/preemption-policy";

/// Managed-cluster label: preemption class
pub const LABEL_HUNBU_PREEMPTION_CLASS: &str =
    "hunbu.federation.bkbcs.tencent.com/preemption-class";

/// Managed-cluster label: preemption value
pub const LABEL_HUNBU_PREEMPTION_VALUE: &str =
    "hunbu.federation.bkbcs.tencent.com/preemption-value";

/// Sub-cluster namespace annotation: mixer-cluster membership
pub const ANNO_HUNBU_MIXER_CLUSTER: &str = "hunbu.federation.bkbcs.tencent.com/mixer-cluster";

/// Sub-cluster namespace annotation: network mode
pub const ANNO_HUNBU_NETWORK_MODE: &str = "hunbu.federation.bkbcs.tencent.com/network-mode";

/// Sub-cluster namespace annotation: preemption policy
pub const ANNO_HUNBU_PREEMPTION_POLICY: &str =
    "hunbu.federation.bkbcs.tencent.com/preemption-policy";

/// Sub-cluster namespace annotation: preemption class
pub const ANNO_HUNBU_PREEMPTION_CLASS: &str =
    "hunbu.federation.bkbcs.tencent.com/preemption-class";

/// Sub-cluster namespace annotation: preemption value
pub const ANNO_HUNBU_PREEMPTION_VALUE: &str =
    "hunbu.federation.bkbcs.tencent.com/preemption-value";
