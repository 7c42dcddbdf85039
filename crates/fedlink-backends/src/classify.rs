//! Sub-cluster classification.
//!
//! Each sub-cluster is exactly one of Normal, Taiji, Hunbu, or Suanli,
//! derived once from the routing labels on its managed-cluster object and
//! then dispatched through [`crate::ReconcileBackend`]. The kind is never
//! stored on the cluster record; re-deriving it per invocation keeps the
//! reconciler stateless.

use std::collections::BTreeMap;

use fedlink_common::keys;

/// The backend kind a sub-cluster delegates quota enforcement to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SubClusterKind {
    /// Plain Kubernetes namespace/quota handling
    #[default]
    Normal,
    /// Taiji RPC scheduler
    Taiji,
    /// Hunbu mixer-cluster annotations
    Hunbu,
    /// Suanli RPC scheduler
    Suanli,
}

impl SubClusterKind {
    /// Derive the kind from managed-cluster routing labels.
    ///
    /// A scheduler label set to `"true"` claims the cluster; Taiji wins
    /// over Suanli wins over Hunbu if several are present. No label means
    /// Normal.
    pub fn from_labels(labels: &BTreeMap<String, String>) -> Self {
        if flag(labels, keys::LABEL_SCHEDULER_TAIJI) {
            Self::Taiji
        } else if flag(labels, keys::LABEL_SCHEDULER_SUANLI) {
            Self::Suanli
        } else if flag(labels, keys::LABEL_SCHEDULER_HUNBU) {
            Self::Hunbu
        } else {
            Self::Normal
        }
    }

    /// The quota annotation routing a quota line to this backend, if the
    /// backend filters quota lines at all.
    pub fn quota_annotation(&self) -> Option<&'static str> {
        match self {
            Self::Normal => None,
            Self::Taiji => Some(keys::ANNO_QUOTA_TAIJI),
            Self::Hunbu => Some(keys::ANNO_QUOTA_HUNBU),
            Self::Suanli => Some(keys::ANNO_QUOTA_SUANLI),
        }
    }

    /// Stable name used in logs and step names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Taiji => "taiji",
            Self::Hunbu => "hunbu",
            Self::Suanli => "suanli",
        }
    }
}

impl std::fmt::Display for SubClusterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn flag(labels: &BTreeMap<String, String>, key: &str) -> bool {
    labels.get(key).map(String::as_str) == Some(keys::VALUE_TRUE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_unlabeled_cluster_is_normal() {
        assert_eq!(
            SubClusterKind::from_labels(&labels(&[("region", "sh")])),
            SubClusterKind::Normal
        );
        assert_eq!(
            SubClusterKind::from_labels(&BTreeMap::new()),
            SubClusterKind::Normal
        );
    }

    #[test]
    fn test_each_scheduler_label_claims_the_cluster() {
        assert_eq!(
            SubClusterKind::from_labels(&labels(&[(keys::LABEL_SCHEDULER_TAIJI, "true")])),
            SubClusterKind::Taiji
        );
        assert_eq!(
            SubClusterKind::from_labels(&labels(&[(keys::LABEL_SCHEDULER_SUANLI, "true")])),
            SubClusterKind::Suanli
        );
        assert_eq!(
            SubClusterKind::from_labels(&labels(&[(keys::LABEL_SCHEDULER_HUNBU, "true")])),
            SubClusterKind::Hunbu
        );
    }

    #[test]
    fn test_label_must_be_truthy() {
        assert_eq!(
            SubClusterKind::from_labels(&labels(&[(keys::LABEL_SCHEDULER_TAIJI, "false")])),
            SubClusterKind::Normal
        );
    }

    #[test]
    fn test_precedence_when_several_labels_present() {
        let both = labels(&[
            (keys::LABEL_SCHEDULER_HUNBU, "true"),
            (keys::LABEL_SCHEDULER_SUANLI, "true"),
            (keys::LABEL_SCHEDULER_TAIJI, "true"),
        ]);
        assert_eq!(SubClusterKind::from_labels(&both), SubClusterKind::Taiji);

        let two = labels(&[
            (keys::LABEL_SCHEDULER_HUNBU, "true"),
            (keys::LABEL_SCHEDULER_SUANLI, "true"),
        ]);
        assert_eq!(SubClusterKind::from_labels(&two), SubClusterKind::Suanli);
    }

    #[test]
    fn test_quota_annotation_per_kind() {
        assert_eq!(SubClusterKind::Normal.quota_annotation(), None);
        assert_eq!(
            SubClusterKind::Taiji.quota_annotation(),
            Some(keys::ANNO_QUOTA_TAIJI)
        );
    }
}
