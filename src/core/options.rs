//! Expansion Options & Results (Component K): pure data records. Grounded
//! in the teacher's `autoscalers/cluster_autoscaler/interface.rs`
//! (`AutoscaleAction`, `ScaleUpInfo`, `ScaleDownInfo`).

use chrono::{DateTime, Utc};

use crate::core::pod::Pod;

#[derive(Debug, Clone)]
pub struct ExpansionOption {
    pub node_group_id: String,
    pub node_count: u64,
    pub accepted_pods: Vec<Pod>,
    pub debug: String,
}

impl ExpansionOption {
    pub fn is_viable(&self, current_target: u64, max_size: u64) -> bool {
        self.node_count > 0 && current_target + self.node_count <= max_size
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaleDownOutcome {
    NoUnneeded,
    NodeDeleted(Vec<String>),
    NoNodeDeleted,
    Error(String),
}

#[derive(Debug, Clone)]
pub struct UnregisteredNodeRecord {
    pub provider_node: String,
    pub first_observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SizeDiscrepancy {
    pub expected: u64,
    pub current: u64,
    pub first_observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PendingScaleUp {
    pub node_group_id: String,
    pub increase: u64,
    pub issued_at: DateTime<Utc>,
    pub expected_add_by: DateTime<Utc>,
}
