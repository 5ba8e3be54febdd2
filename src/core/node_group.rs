//! `NodeGroup`, grounded in the teacher's
//! `autoscalers/cluster_autoscaler/interface.rs::NodeGroup`, generalized
//! from an in-process `node_template: Node` bundle to a handle over a real
//! `CloudProvider`-owned group plus a monotonic naming counter (the
//! `total_allocated` field in the teacher).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::node::Node;

/// Identifies and bounds one cloud-managed group of homogeneous nodes.
#[derive(Debug)]
pub struct NodeGroup {
    pub id: String,
    pub min_size: u64,
    pub max_size: u64,
    /// Declared desired member count, as last observed from the provider.
    target_size: AtomicU64,
    /// Monotonic counter used to mint stable, inspectable node names.
    allocated: AtomicU64,
}

impl NodeGroup {
    pub fn new(id: impl Into<String>, min_size: u64, max_size: u64, target_size: u64) -> Self {
        Self {
            id: id.into(),
            min_size,
            max_size,
            target_size: AtomicU64::new(target_size),
            allocated: AtomicU64::new(0),
        }
    }

    pub fn target_size(&self) -> u64 {
        self.target_size.load(Ordering::SeqCst)
    }

    pub fn set_target_size(&self, value: u64) {
        self.target_size.store(value, Ordering::SeqCst);
    }

    pub fn headroom(&self) -> u64 {
        self.max_size.saturating_sub(self.target_size())
    }

    pub fn is_at_max(&self) -> bool {
        self.target_size() >= self.max_size
    }

    /// Mint the next node name for this group, e.g. `group-0`, `group-1`.
    pub fn next_node_name(&self) -> String {
        let idx = self.allocated.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.id, idx)
    }
}

/// A node built from a group's template: what every fresh member of this
/// group will look like once it registers.
pub fn build_template(group: &NodeGroup, base: &Node) -> Node {
    let mut template = base.clone();
    template.metadata.name = format!("{}-template", group.id);
    template
}
