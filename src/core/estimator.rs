//! Bin-Packing Estimator (Component E): First-Fit-Decreasing over a
//! template node, plus a `BasicEstimator` fallback. Grounded in the
//! teacher's `kube_cluster_autoscaler.rs::try_find_fitting_template`, and
//! registered by name the way the teacher's `PLUGIN_REGISTRY` registers
//! filter/score plugins.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::core::node::Node;
use crate::core::pod::Pod;
use crate::core::predicates::PredicateChecker;
use crate::core::snapshot::NodeSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EstimatorKind {
    Binpacking,
    Basic,
}

pub trait Estimator: Send + Sync {
    fn estimate(&self, pods: &[Pod], template: &Node, upcoming_nodes: u64) -> u64;
}

/// Score each pod by its aggregate fractional request against the
/// template's capacity; larger scores are placed first.
fn score(pod: &Pod, template: &Node) -> f64 {
    let req = pod.calculate_requested_resources();
    let cap = template.status.capacity;
    let cpu = if cap.cpu == 0 {
        0.0
    } else {
        req.cpu as f64 / cap.cpu as f64
    };
    let ram = if cap.ram == 0 {
        0.0
    } else {
        req.ram as f64 / cap.ram as f64
    };
    cpu + ram
}

pub struct BinpackingEstimator;

impl Estimator for BinpackingEstimator {
    fn estimate(&self, pods: &[Pod], template: &Node, upcoming_nodes: u64) -> u64 {
        if pods.is_empty() {
            return 0;
        }
        let mut ordered: Vec<&Pod> = pods.iter().collect();
        ordered.sort_by(|a, b| score(b, template).partial_cmp(&score(a, template)).unwrap());

        let checker = PredicateChecker;
        let mut nodes: Vec<NodeSnapshot> = (0..upcoming_nodes)
            .map(|i| {
                let mut n = template.clone();
                n.metadata.name = format!("{}-upcoming-{}", template.metadata.name, i);
                NodeSnapshot::new(n, vec![])
            })
            .collect();

        for pod in ordered {
            let mut placed = false;
            for snapshot in nodes.iter_mut() {
                if checker.check(pod, snapshot).is_ok() {
                    *snapshot = snapshot.with_additional_workload(pod);
                    placed = true;
                    break;
                }
            }
            if !placed {
                let mut fresh = template.clone();
                fresh.metadata.name = format!("{}-new-{}", template.metadata.name, nodes.len());
                let snapshot = NodeSnapshot::new(fresh, vec![pod.clone()]);
                nodes.push(snapshot);
            }
        }

        (nodes.len() as u64).saturating_sub(upcoming_nodes)
    }
}

/// Diagnostic/fallback estimator: sums requests and divides by template
/// allocatable, ignoring bin-packing effects.
pub struct BasicEstimator;

impl Estimator for BasicEstimator {
    fn estimate(&self, pods: &[Pod], template: &Node, upcoming_nodes: u64) -> u64 {
        if pods.is_empty() {
            return 0;
        }
        let total = pods
            .iter()
            .fold(crate::common::Resources::default(), |acc, p| {
                acc + p.calculate_requested_resources()
            });
        let alloc = template.status.allocatable;
        let by_cpu = if alloc.cpu == 0 {
            0
        } else {
            (total.cpu + alloc.cpu - 1) / alloc.cpu
        };
        let by_ram = if alloc.ram == 0 {
            0
        } else {
            (total.ram + alloc.ram - 1) / alloc.ram
        };
        by_cpu.max(by_ram).saturating_sub(upcoming_nodes)
    }
}

lazy_static! {
    pub static ref ESTIMATOR_REGISTRY: BTreeMap<&'static str, Box<dyn Estimator>> = {
        let mut m: BTreeMap<&'static str, Box<dyn Estimator>> = BTreeMap::new();
        m.insert("binpacking", Box::new(BinpackingEstimator));
        m.insert("basic", Box::new(BasicEstimator));
        m
    };
}

pub fn resolve(kind: EstimatorKind) -> &'static dyn Estimator {
    let name = match kind {
        EstimatorKind::Binpacking => "binpacking",
        EstimatorKind::Basic => "basic",
    };
    ESTIMATOR_REGISTRY
        .get(name)
        .expect("estimator registry is populated for every EstimatorKind variant")
        .as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Resources;

    fn template() -> Node {
        Node::new("template", Resources::new(1000, 2 * 1024 * 1024 * 1024))
    }

    #[test]
    fn estimate_ten_pods_no_upcoming() {
        let t = template();
        let pods: Vec<Pod> = (0..10)
            .map(|i| Pod::new(format!("p{i}"), Resources::new(350, 1024 * 1024 * 1024)))
            .collect();
        assert_eq!(BinpackingEstimator.estimate(&pods, &t, 0), 5);
    }

    #[test]
    fn estimate_ten_pods_with_upcoming() {
        let t = template();
        let pods: Vec<Pod> = (0..10)
            .map(|i| Pod::new(format!("p{i}"), Resources::new(350, 1024 * 1024 * 1024)))
            .collect();
        assert_eq!(BinpackingEstimator.estimate(&pods, &t, 2), 3);
    }

    #[test]
    fn monotonic_in_pod_count() {
        let t = template();
        let pods: Vec<Pod> = (0..4)
            .map(|i| Pod::new(format!("p{i}"), Resources::new(500, 500 * 1024 * 1024)))
            .collect();
        let fewer = BinpackingEstimator.estimate(&pods[..3], &t, 0);
        let more = BinpackingEstimator.estimate(&pods, &t, 0);
        assert!(more >= fewer);
    }

    #[test]
    fn monotonic_in_upcoming_nodes() {
        let t = template();
        let pods: Vec<Pod> = (0..6)
            .map(|i| Pod::new(format!("p{i}"), Resources::new(500, 500 * 1024 * 1024)))
            .collect();
        let without = BinpackingEstimator.estimate(&pods, &t, 0);
        let with = BinpackingEstimator.estimate(&pods, &t, 2);
        assert!(with <= without);
    }
}
