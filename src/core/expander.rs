//! Expander Strategy (Component F): picks among viable scale-up options.
//! Resolved by name from a `lazy_static` registry, matching the teacher's
//! `PLUGIN_REGISTRY` shape; an unknown name is a fatal startup error the
//! same way an unknown `autoscaler_type` panics in the teacher's
//! `resolve_cluster_autoscaler_impl`.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use rand::seq::SliceRandom;
use rand::thread_rng;
use serde::{Deserialize, Serialize};

use crate::common::Resources;
use crate::core::cloud_provider::CloudProvider;
use crate::core::node::Node;
use crate::core::options::ExpansionOption;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpanderKind {
    Random,
    MostPods,
    LeastWaste,
    LeastCost,
}

pub trait Expander: Send + Sync {
    fn best_option<'a>(
        &self,
        options: &'a [ExpansionOption],
        templates: &BTreeMap<String, Node>,
        provider: &dyn CloudProvider,
    ) -> Option<&'a ExpansionOption>;
}

fn random_pick(options: &[ExpansionOption]) -> Option<&ExpansionOption> {
    options.choose(&mut thread_rng())
}

pub struct RandomExpander;
impl Expander for RandomExpander {
    fn best_option<'a>(
        &self,
        options: &'a [ExpansionOption],
        _templates: &BTreeMap<String, Node>,
        _provider: &dyn CloudProvider,
    ) -> Option<&'a ExpansionOption> {
        random_pick(options)
    }
}

pub struct MostPodsExpander;
impl Expander for MostPodsExpander {
    fn best_option<'a>(
        &self,
        options: &'a [ExpansionOption],
        _templates: &BTreeMap<String, Node>,
        _provider: &dyn CloudProvider,
    ) -> Option<&'a ExpansionOption> {
        let max = options.iter().map(|o| o.accepted_pods.len()).max()?;
        let tied: Vec<&ExpansionOption> = options
            .iter()
            .filter(|o| o.accepted_pods.len() == max)
            .collect();
        tied.choose(&mut thread_rng()).copied()
    }
}

fn waste(option: &ExpansionOption, template: &Node) -> f64 {
    let cap = template.status.capacity;
    let total_cpu = cap.cpu * option.node_count;
    let total_ram = cap.ram * option.node_count;
    let accepted = option
        .accepted_pods
        .iter()
        .fold(Resources::default(), |acc, p| {
            acc + p.calculate_requested_resources()
        });
    let cpu_waste = total_cpu.saturating_sub(accepted.cpu) as f64;
    let ram_waste = total_ram.saturating_sub(accepted.ram) as f64;
    // Lexicographic preference over (cpu, ram): weight cpu far more
    // heavily so it dominates comparisons.
    cpu_waste * 1e12 + ram_waste
}

pub struct LeastWasteExpander;
impl Expander for LeastWasteExpander {
    fn best_option<'a>(
        &self,
        options: &'a [ExpansionOption],
        templates: &BTreeMap<String, Node>,
        _provider: &dyn CloudProvider,
    ) -> Option<&'a ExpansionOption> {
        let mut best_waste = f64::MAX;
        let mut tied: Vec<&ExpansionOption> = Vec::new();
        for option in options {
            let Some(template) = templates.get(&option.node_group_id) else {
                continue;
            };
            let w = waste(option, template);
            if w < best_waste {
                best_waste = w;
                tied.clear();
                tied.push(option);
            } else if (w - best_waste).abs() < f64::EPSILON {
                tied.push(option);
            }
        }
        tied.choose(&mut thread_rng()).copied()
    }
}

pub struct LeastCostExpander;
impl Expander for LeastCostExpander {
    fn best_option<'a>(
        &self,
        options: &'a [ExpansionOption],
        _templates: &BTreeMap<String, Node>,
        provider: &dyn CloudProvider,
    ) -> Option<&'a ExpansionOption> {
        let mut best_cost = f64::MAX;
        let mut tied: Vec<&ExpansionOption> = Vec::new();
        for option in options {
            let Some(cost) = provider.node_cost(&option.node_group_id) else {
                continue;
            };
            let total = cost * option.node_count as f64;
            if total < best_cost {
                best_cost = total;
                tied.clear();
                tied.push(option);
            } else if (total - best_cost).abs() < f64::EPSILON {
                tied.push(option);
            }
        }
        if tied.is_empty() {
            return random_pick(options);
        }
        tied.choose(&mut thread_rng()).copied()
    }
}

lazy_static! {
    pub static ref EXPANDER_REGISTRY: BTreeMap<&'static str, Box<dyn Expander>> = {
        let mut m: BTreeMap<&'static str, Box<dyn Expander>> = BTreeMap::new();
        m.insert("random", Box::new(RandomExpander));
        m.insert("most-pods", Box::new(MostPodsExpander));
        m.insert("least-waste", Box::new(LeastWasteExpander));
        m.insert("least-cost", Box::new(LeastCostExpander));
        m
    };
}

pub fn resolve(kind: ExpanderKind) -> &'static dyn Expander {
    let name = match kind {
        ExpanderKind::Random => "random",
        ExpanderKind::MostPods => "most-pods",
        ExpanderKind::LeastWaste => "least-waste",
        ExpanderKind::LeastCost => "least-cost",
    };
    EXPANDER_REGISTRY
        .get(name)
        .expect("expander registry is populated for every ExpanderKind variant")
        .as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cloud_provider::FakeCloudProvider;
    use crate::core::pod::Pod;

    #[test]
    fn least_waste_picks_lowcpu() {
        let provider = FakeCloudProvider::new();
        let pod = Pod::new("p1", Resources::new(500, 1024 * 1024 * 1024));

        let mut templates = BTreeMap::new();
        templates.insert(
            "balanced".to_string(),
            Node::new("balanced-tpl", Resources::new(16_000, 16 * 1024 * 1024 * 1024)),
        );
        templates.insert(
            "highmem".to_string(),
            Node::new("highmem-tpl", Resources::new(16_000, 32 * 1024 * 1024 * 1024)),
        );
        templates.insert(
            "lowcpu".to_string(),
            Node::new("lowcpu-tpl", Resources::new(8_000, 16 * 1024 * 1024 * 1024)),
        );

        let options = vec![
            ExpansionOption {
                node_group_id: "balanced".to_string(),
                node_count: 1,
                accepted_pods: vec![pod.clone()],
                debug: String::new(),
            },
            ExpansionOption {
                node_group_id: "highmem".to_string(),
                node_count: 1,
                accepted_pods: vec![pod.clone()],
                debug: String::new(),
            },
            ExpansionOption {
                node_group_id: "lowcpu".to_string(),
                node_count: 1,
                accepted_pods: vec![pod],
                debug: String::new(),
            },
        ];

        let best = LeastWasteExpander.best_option(&options, &templates, &provider);
        assert_eq!(best.unwrap().node_group_id, "lowcpu");
    }
}
