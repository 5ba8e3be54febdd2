//! `CloudProvider`/`NodeGroupHandle` trait contracts (§6), plus a
//! deterministic in-memory fake used by tests. Grounded in the shape of
//! the teacher's `ClusterAutoscalerAlgorithm` trait, which is likewise a
//! thin handle bundle passed around rather than owned by the algorithm.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::core::node::Node;
use crate::core::node_group::NodeGroup;
use crate::error::CaResult;

pub trait CloudProvider: Send + Sync {
    fn node_groups(&self) -> Vec<String>;
    fn node_group(&self, id: &str) -> Option<&NodeGroup>;
    fn node_group_for_node(&self, node: &Node) -> Option<String>;

    fn template_node(&self, group_id: &str) -> Option<Node>;
    fn nodes_in_group(&self, group_id: &str) -> CaResult<Vec<String>>;

    fn increase_size(&self, group_id: &str, delta: u64) -> CaResult<()>;
    fn decrease_target_size(&self, group_id: &str, delta: u64) -> CaResult<()>;
    fn delete_nodes(&self, group_id: &str, node_names: &[String]) -> CaResult<()>;

    /// Relative cost of one more node in this group, used by the
    /// least-cost expander. `None` means "unknown", which the expander
    /// treats as never preferred.
    fn node_cost(&self, _group_id: &str) -> Option<f64> {
        None
    }
}

/// A deterministic in-memory fake: every group's membership lives in a
/// plain map guarded by a single mutex, matching the §5 note that provider
/// adapter caches are internally synchronized and otherwise opaque to the
/// core.
pub struct FakeCloudProvider {
    groups: BTreeMap<String, NodeGroup>,
    templates: BTreeMap<String, Node>,
    members: Mutex<BTreeMap<String, Vec<String>>>,
    costs: BTreeMap<String, f64>,
}

impl FakeCloudProvider {
    pub fn new() -> Self {
        Self {
            groups: BTreeMap::new(),
            templates: BTreeMap::new(),
            members: Mutex::new(BTreeMap::new()),
            costs: BTreeMap::new(),
        }
    }

    pub fn add_group(&mut self, group: NodeGroup, template: Node, members: Vec<String>) {
        let id = group.id.clone();
        self.members.lock().insert(id.clone(), members);
        self.templates.insert(id.clone(), template);
        self.groups.insert(id, group);
    }

    pub fn set_cost(&mut self, group_id: &str, cost: f64) {
        self.costs.insert(group_id.to_string(), cost);
    }
}

impl Default for FakeCloudProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CloudProvider for FakeCloudProvider {
    fn node_groups(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    fn node_group(&self, id: &str) -> Option<&NodeGroup> {
        self.groups.get(id)
    }

    fn node_group_for_node(&self, node: &Node) -> Option<String> {
        let members = self.members.lock();
        members
            .iter()
            .find(|(_, names)| names.contains(&node.metadata.name))
            .map(|(id, _)| id.clone())
    }

    fn template_node(&self, group_id: &str) -> Option<Node> {
        self.templates.get(group_id).cloned()
    }

    fn nodes_in_group(&self, group_id: &str) -> CaResult<Vec<String>> {
        Ok(self
            .members
            .lock()
            .get(group_id)
            .cloned()
            .unwrap_or_default())
    }

    fn increase_size(&self, group_id: &str, delta: u64) -> CaResult<()> {
        if let Some(group) = self.groups.get(group_id) {
            group.set_target_size(group.target_size() + delta);
        }
        Ok(())
    }

    fn decrease_target_size(&self, group_id: &str, delta: u64) -> CaResult<()> {
        if let Some(group) = self.groups.get(group_id) {
            group.set_target_size(group.target_size().saturating_sub(delta));
        }
        Ok(())
    }

    fn delete_nodes(&self, group_id: &str, node_names: &[String]) -> CaResult<()> {
        let mut members = self.members.lock();
        if let Some(list) = members.get_mut(group_id) {
            list.retain(|n| !node_names.contains(n));
        }
        if let Some(group) = self.groups.get(group_id) {
            group.set_target_size(group.target_size().saturating_sub(node_names.len() as u64));
        }
        Ok(())
    }

    fn node_cost(&self, group_id: &str) -> Option<f64> {
        self.costs.get(group_id).copied()
    }
}
