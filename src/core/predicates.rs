//! Predicate Checker (Component A): re-runs scheduler-equivalent fit
//! predicates. Grounded directly in the teacher's
//! `core/scheduler/plugin.rs`, which assembles a name-keyed registry of
//! `Box<dyn FilterPlugin>` via `lazy_static!` (`PLUGIN_REGISTRY`); this
//! module keeps that registry shape for the filter predicates used here.

use std::collections::BTreeMap;

use lazy_static::lazy_static;

use crate::core::pod::Pod;
use crate::core::snapshot::NodeSnapshot;

pub trait FilterPredicate: Send + Sync {
    fn name(&self) -> &'static str;
    fn fits(&self, pod: &Pod, snapshot: &NodeSnapshot) -> bool;
}

pub struct ResourceFit;
impl FilterPredicate for ResourceFit {
    fn name(&self) -> &'static str {
        "ResourceFit"
    }
    fn fits(&self, pod: &Pod, snapshot: &NodeSnapshot) -> bool {
        snapshot
            .remaining()
            .fits(&pod.calculate_requested_resources())
    }
}

pub struct PortFit;
impl FilterPredicate for PortFit {
    fn name(&self) -> &'static str {
        "PortFit"
    }
    fn fits(&self, pod: &Pod, snapshot: &NodeSnapshot) -> bool {
        pod.spec
            .containers
            .iter()
            .flat_map(|c| c.host_ports.iter())
            .all(|p| !snapshot.used_host_ports.contains(p))
    }
}

pub struct NodeSelectorFit;
impl FilterPredicate for NodeSelectorFit {
    fn name(&self) -> &'static str {
        "NodeSelectorFit"
    }
    fn fits(&self, pod: &Pod, snapshot: &NodeSnapshot) -> bool {
        pod.spec
            .node_selector
            .iter()
            .all(|(k, v)| snapshot.node.metadata.labels.get(k) == Some(v))
    }
}

pub struct TaintToleration;
impl FilterPredicate for TaintToleration {
    fn name(&self) -> &'static str {
        "TaintToleration"
    }
    fn fits(&self, pod: &Pod, snapshot: &NodeSnapshot) -> bool {
        snapshot.taints().iter().all(|taint| {
            pod.spec.tolerations.iter().any(|t| {
                t.key == taint.key
                    && t.value == taint.value
                    && (t.effect.is_none() || t.effect == Some(taint.effect))
            })
        })
    }
}

pub struct VolumeFit;
impl FilterPredicate for VolumeFit {
    fn name(&self) -> &'static str {
        "VolumeFit"
    }
    fn fits(&self, _pod: &Pod, snapshot: &NodeSnapshot) -> bool {
        !snapshot.node.spec.unschedulable
    }
}

pub struct MaxPodsFit;
impl FilterPredicate for MaxPodsFit {
    fn name(&self) -> &'static str {
        "MaxPodsFit"
    }
    fn fits(&self, _pod: &Pod, snapshot: &NodeSnapshot) -> bool {
        snapshot.max_pods() == 0 || (snapshot.pod_count() as u32) < snapshot.max_pods()
    }
}

/// A node that isn't `Ready` is never a valid relocation/scheduling target,
/// whether or not it's also unschedulable.
pub struct NodeReady;
impl FilterPredicate for NodeReady {
    fn name(&self) -> &'static str {
        "NodeReady"
    }
    fn fits(&self, _pod: &Pod, snapshot: &NodeSnapshot) -> bool {
        snapshot.node.is_ready()
    }
}

lazy_static! {
    pub static ref PREDICATE_REGISTRY: BTreeMap<&'static str, Box<dyn FilterPredicate>> = {
        let mut m: BTreeMap<&'static str, Box<dyn FilterPredicate>> = BTreeMap::new();
        m.insert("ResourceFit", Box::new(ResourceFit));
        m.insert("PortFit", Box::new(PortFit));
        m.insert("NodeSelectorFit", Box::new(NodeSelectorFit));
        m.insert("TaintToleration", Box::new(TaintToleration));
        m.insert("VolumeFit", Box::new(VolumeFit));
        m.insert("MaxPodsFit", Box::new(MaxPodsFit));
        m.insert("NodeReady", Box::new(NodeReady));
        m
    };
}

/// Stateless: runs every registered predicate against `(pod, snapshot)`.
pub struct PredicateChecker;

impl PredicateChecker {
    pub fn check(&self, pod: &Pod, snapshot: &NodeSnapshot) -> Result<(), &'static str> {
        for predicate in PREDICATE_REGISTRY.values() {
            if !predicate.fits(pod, snapshot) {
                return Err(predicate.name());
            }
        }
        Ok(())
    }

    /// Returns the first fit in deterministic (`BTreeMap`-ordered) name
    /// order, matching the teacher's name-keyed, deterministically
    /// iterated filter-plugin registry.
    pub fn fits_any<'a>(
        &self,
        pod: &Pod,
        snapshots: &'a BTreeMap<String, NodeSnapshot>,
    ) -> Option<&'a str> {
        snapshots
            .iter()
            .find(|(_, snapshot)| self.check(pod, snapshot).is_ok())
            .map(|(name, _)| name.as_str())
    }
}

impl Default for PredicateChecker {
    fn default() -> Self {
        Self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Resources;
    use crate::core::node::Node;

    #[test]
    fn resource_fit_rejects_oversized_pod() {
        let node = Node::new("n1", Resources::new(1000, 1024));
        let snapshot = NodeSnapshot::new(node, vec![]);
        let pod = Pod::new("p1", Resources::new(2000, 512));
        assert_eq!(
            PredicateChecker.check(&pod, &snapshot),
            Err("ResourceFit")
        );
    }

    #[test]
    fn fits_any_picks_deterministically() {
        let node_a = Node::new("a", Resources::new(1000, 1024));
        let node_b = Node::new("b", Resources::new(1000, 1024));
        let mut snapshots = BTreeMap::new();
        snapshots.insert("a".to_string(), NodeSnapshot::new(node_a, vec![]));
        snapshots.insert("b".to_string(), NodeSnapshot::new(node_b, vec![]));
        let pod = Pod::new("p1", Resources::new(100, 100));
        assert_eq!(PredicateChecker.fits_any(&pod, &snapshots), Some("a"));
    }
}
