//! Shared value types used across the cluster/workload data model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Resource quantities, in the units the orchestrator API itself uses:
/// CPU in milli-cores, memory in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub cpu: u64,
    pub ram: u64,
}

impl Resources {
    pub fn new(cpu: u64, ram: u64) -> Self {
        Self { cpu, ram }
    }

    pub fn is_zero(&self) -> bool {
        self.cpu == 0 && self.ram == 0
    }

    pub fn saturating_sub(&self, other: &Resources) -> Resources {
        Resources {
            cpu: self.cpu.saturating_sub(other.cpu),
            ram: self.ram.saturating_sub(other.ram),
        }
    }

    pub fn fits(&self, request: &Resources) -> bool {
        self.cpu >= request.cpu && self.ram >= request.ram
    }
}

impl std::ops::Add for Resources {
    type Output = Resources;
    fn add(self, rhs: Resources) -> Resources {
        Resources {
            cpu: self.cpu + rhs.cpu,
            ram: self.ram + rhs.ram,
        }
    }
}

impl std::ops::AddAssign for Resources {
    fn add_assign(&mut self, rhs: Resources) {
        self.cpu += rhs.cpu;
        self.ram += rhs.ram;
    }
}

/// Minimal analogue of the orchestrator's `ObjectMeta`: identity and
/// bookkeeping common to both pods and nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

impl ObjectMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: "default".to_string(),
            labels: BTreeMap::new(),
            creation_timestamp: Some(Utc::now()),
        }
    }
}

/// A taint that repels workloads unless tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,
    pub value: String,
    pub effect: TaintEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toleration {
    pub key: String,
    pub value: String,
    pub effect: Option<TaintEffect>,
}

/// A condition with a transition timestamp, the shape shared by both
/// node conditions (`Ready`, `OutOfDisk`, ...) and the workload's own
/// schedule condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub kind: String,
    pub status: ConditionStatus,
    pub reason: String,
    pub message: String,
    pub last_transition_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

pub const CLUSTER_AUTOSCALER_ORIGIN_LABEL: &str = "cluster-autoscaler.kubernetes.io/origin";
pub const NODE_GROUP_LABEL: &str = "cluster-autoscaler.kubernetes.io/node-group";
