//! Workload (pod) data model, grounded in the richer
//! `ObjectMeta`/`PodSpec`/`Container` generation the teacher's own
//! integration tests assume.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{Condition, ConditionStatus, ObjectMeta, Resources, Toleration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnerKind {
    ReplicationController,
    ReplicaSet,
    Job,
    DaemonSet,
    Mirror,
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeRef {
    pub name: String,
    #[serde(default)]
    pub local: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub requests: Resources,
    #[serde(default)]
    pub host_ports: Vec<u16>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodSpec {
    #[serde(default)]
    pub containers: Vec<Container>,
    #[serde(default)]
    pub node_selector: BTreeMap<String, String>,
    #[serde(default)]
    pub tolerations: Vec<Toleration>,
    #[serde(default)]
    pub volumes: Vec<VolumeRef>,
    #[serde(default)]
    pub owner_kind: Option<OwnerKind>,
    #[serde(default)]
    pub owner_replicas: Option<u32>,
    #[serde(default)]
    pub owner_min_replicas: Option<u32>,
    #[serde(default)]
    pub node_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PodStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    pub metadata: ObjectMeta,
    pub spec: PodSpec,
    #[serde(default)]
    pub status: PodStatus,
}

impl Pod {
    pub fn new(name: impl Into<String>, requests: Resources) -> Self {
        Self {
            metadata: ObjectMeta::new(name),
            spec: PodSpec {
                containers: vec![Container {
                    name: "main".to_string(),
                    requests,
                    host_ports: Vec::new(),
                }],
                ..Default::default()
            },
            status: PodStatus::default(),
        }
    }

    pub fn calculate_requested_resources(&self) -> Resources {
        self.spec
            .containers
            .iter()
            .fold(Resources::default(), |acc, c| acc + c.requests)
    }

    pub fn is_unschedulable(&self) -> bool {
        self.spec.node_name.is_none()
            && self
                .status
                .conditions
                .iter()
                .any(|c| c.kind == "PodScheduled" && c.status == ConditionStatus::False)
    }

    pub fn unschedulable_since(&self) -> Option<DateTime<Utc>> {
        self.status
            .conditions
            .iter()
            .find(|c| c.kind == "PodScheduled" && c.status == ConditionStatus::False)
            .map(|c| c.last_transition_time)
    }

    pub fn is_daemonset_or_mirror(&self) -> bool {
        matches!(
            self.spec.owner_kind,
            Some(OwnerKind::DaemonSet) | Some(OwnerKind::Mirror)
        )
    }

    /// A replicated, evictable workload: belongs to a controller that will
    /// recreate it elsewhere.
    pub fn is_replicated(&self) -> bool {
        match self.spec.owner_kind {
            Some(OwnerKind::ReplicationController) | Some(OwnerKind::ReplicaSet) => {
                self.spec.owner_replicas.unwrap_or(0) >= self.spec.owner_min_replicas.unwrap_or(0)
            }
            Some(OwnerKind::Job) => true,
            _ => false,
        }
    }

    pub fn has_local_storage(&self) -> bool {
        self.spec.volumes.iter().any(|v| v.local)
    }

    pub fn is_system_pod(&self) -> bool {
        self.metadata.namespace == "kube-system"
    }
}
