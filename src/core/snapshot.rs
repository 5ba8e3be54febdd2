//! Node Snapshot (Component B): an immutable-by-convention bundle of a
//! node plus the workloads hypothetically placed on it, grounded in the
//! resource-headroom math the teacher performs inline in
//! `core/scheduler/plugin.rs::LeastAllocatedResources`.

use std::collections::BTreeSet;

use crate::common::{Resources, Taint};
use crate::core::node::Node;
use crate::core::pod::Pod;

#[derive(Debug, Clone)]
pub struct NodeSnapshot {
    pub node: Node,
    pub placed: Vec<Pod>,
    pub used_host_ports: BTreeSet<u16>,
    requested: Resources,
}

impl NodeSnapshot {
    pub fn new(node: Node, placed: Vec<Pod>) -> Self {
        let requested = placed
            .iter()
            .fold(Resources::default(), |acc, p| acc + p.calculate_requested_resources());
        let used_host_ports = placed
            .iter()
            .flat_map(|p| p.spec.containers.iter())
            .flat_map(|c| c.host_ports.iter().copied())
            .collect();
        Self {
            node,
            placed,
            used_host_ports,
            requested,
        }
    }

    pub fn requested(&self) -> Resources {
        self.requested
    }

    pub fn allocatable(&self) -> Resources {
        self.node.status.allocatable
    }

    pub fn remaining(&self) -> Resources {
        self.allocatable().saturating_sub(self.requested)
    }

    pub fn pod_count(&self) -> usize {
        self.placed.len()
    }

    pub fn max_pods(&self) -> u32 {
        self.node.status.max_pods
    }

    pub fn taints(&self) -> &[Taint] {
        &self.node.spec.taints
    }

    /// Pure: returns a new snapshot with `pod` hypothetically added,
    /// never mutates `self`.
    pub fn with_additional_workload(&self, pod: &Pod) -> NodeSnapshot {
        let mut placed = self.placed.clone();
        placed.push(pod.clone());
        NodeSnapshot::new(self.node.clone(), placed)
    }

    /// Utilization used by the scale-down planner: the max of the
    /// per-resource occupancy ratios.
    pub fn utilization(&self) -> f64 {
        let alloc = self.allocatable();
        let cpu_ratio = if alloc.cpu == 0 {
            0.0
        } else {
            self.requested.cpu as f64 / alloc.cpu as f64
        };
        let ram_ratio = if alloc.ram == 0 {
            0.0
        } else {
            self.requested.ram as f64 / alloc.ram as f64
        };
        cpu_ratio.max(ram_ratio)
    }
}
