//! Scale-Down Planner (Component H). Grounded in the teacher's
//! `kube_cluster_autoscaler.rs::scale_down`
//! (`is_under_threshold_utilization`, `all_pods_can_be_moved_to_other_nodes`
//! with rollback-on-failure via a node-list clone).

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::core::context::AutoscalingContext;
use crate::core::drain::DrainClassifier;
use crate::core::events::AutoscalerEvent;
use crate::core::node::Node;
use crate::core::options::ScaleDownOutcome;
use crate::core::pod::Pod;
use crate::core::snapshot::NodeSnapshot;
use crate::error::CaResult;

/// Phase 1 state: which nodes are currently unneeded, and since when.
#[derive(Default)]
pub struct UnneededTracker {
    since: BTreeMap<String, DateTime<Utc>>,
    /// Memoized hypothetical relocation targets from the most recent
    /// successful simulation, `pod key -> target node`.
    pub placement_hints: BTreeMap<String, String>,
}

impl UnneededTracker {
    pub fn is_empty(&self) -> bool {
        self.since.is_empty()
    }

    pub fn clear(&mut self) {
        self.since.clear();
        self.placement_hints.clear();
    }

    pub fn since(&self, node: &str) -> Option<DateTime<Utc>> {
        self.since.get(node).copied()
    }
}

struct ClusterSnapshot {
    by_name: BTreeMap<String, NodeSnapshot>,
}

impl ClusterSnapshot {
    fn build(
        nodes: &[Node],
        orchestrator: &dyn crate::core::orchestrator::OrchestratorClient,
    ) -> CaResult<Self> {
        let mut by_name = BTreeMap::new();
        for node in nodes {
            let pods = orchestrator.pods_on_node(&node.metadata.name)?;
            by_name.insert(node.metadata.name.clone(), NodeSnapshot::new(node.clone(), pods));
        }
        Ok(Self { by_name })
    }
}

/// Phase 1: recompute the unneeded set every tick, unconditionally.
pub fn update_unneeded_nodes(
    ctx: &AutoscalingContext,
    tracker: &mut UnneededTracker,
    nodes: &[Node],
    now: DateTime<Utc>,
) -> CaResult<()> {
    let snapshot = ClusterSnapshot::build(nodes, ctx.orchestrator.as_ref())?;

    let mut candidates: Vec<String> = Vec::new();
    for (name, node_snapshot) in &snapshot.by_name {
        if node_snapshot.utilization() < ctx.options.scale_down_utilization_threshold {
            candidates.push(name.clone());
        }
    }

    let mut new_hints = BTreeMap::new();
    let mut still_unneeded: Vec<String> = Vec::new();

    for candidate in &candidates {
        if can_relocate_all(ctx, &snapshot, candidate, &mut new_hints, false) {
            still_unneeded.push(candidate.clone());
        }
    }

    let mut fresh_since = BTreeMap::new();
    for name in &still_unneeded {
        let since = tracker.since(name).unwrap_or(now);
        fresh_since.insert(name.clone(), since);
    }
    tracker.since = fresh_since;
    tracker.placement_hints = new_hints;

    Ok(())
}

fn can_relocate_all(
    ctx: &AutoscalingContext,
    snapshot: &ClusterSnapshot,
    node_name: &str,
    hints: &mut BTreeMap<String, String>,
    detailed: bool,
) -> bool {
    let Some(node_snapshot) = snapshot.by_name.get(node_name) else {
        return false;
    };

    let classifier = DrainClassifier::new(
        ctx.options.skip_nodes_with_system_pods,
        ctx.options.skip_nodes_with_local_storage,
    );
    let pdbs = if detailed {
        ctx.orchestrator.list_pod_disruption_budgets().unwrap_or_default()
    } else {
        Vec::new()
    };
    let plan = match classifier.classify(&node_snapshot.placed, &pdbs) {
        Ok(plan) => plan,
        Err(_) => return false,
    };

    if plan.evictable.is_empty() {
        return true;
    }

    // Clone the rest of the cluster so a failed simulation never mutates
    // real state; the teacher does the same rollback-on-failure via
    // `nodes.clone()` before trying relocation. Unready nodes are never
    // valid relocation targets -- `fits_any` also checks this via the
    // `NodeReady` predicate, but we exclude them here too so an unready
    // node can never be picked as the sole target and silently "absorb"
    // a workload it could never actually run.
    let mut others: BTreeMap<String, NodeSnapshot> = snapshot
        .by_name
        .iter()
        .filter(|(name, s)| name.as_str() != node_name && s.node.is_ready())
        .map(|(name, s)| (name.clone(), s.clone()))
        .collect();

    let mut local_hints = BTreeMap::new();
    for pod in &plan.evictable {
        let Some(target) = ctx.predicate_checker.fits_any(pod, &others) else {
            return false;
        };
        let target = target.to_string();
        let updated = others.get(&target).unwrap().with_additional_workload(pod);
        others.insert(target.clone(), updated);
        local_hints.insert(pod_key(pod), target);
    }

    hints.extend(local_hints);
    true
}

fn pod_key(pod: &Pod) -> String {
    format!("{}/{}", pod.metadata.namespace, pod.metadata.name)
}

/// Phase 2: attempt to actually delete one node (or a bulk-empty batch).
pub fn try_to_scale_down(
    ctx: &AutoscalingContext,
    tracker: &mut UnneededTracker,
    nodes: &[Node],
    now: DateTime<Utc>,
) -> CaResult<ScaleDownOutcome> {
    if tracker.is_empty() {
        return Ok(ScaleDownOutcome::NoUnneeded);
    }

    let snapshot = ClusterSnapshot::build(nodes, ctx.orchestrator.as_ref())?;
    let nodes_by_name: BTreeMap<String, &Node> =
        nodes.iter().map(|n| (n.metadata.name.clone(), n)).collect();

    let mut eligible: Vec<String> = Vec::new();
    for name in snapshot.by_name.keys() {
        let Some(since) = tracker.since(name) else {
            continue;
        };
        let Some(node) = nodes_by_name.get(name) else {
            continue;
        };
        let threshold = if node.is_ready() {
            Duration::seconds(ctx.options.scale_down_unneeded_time as i64)
        } else {
            Duration::seconds(ctx.options.scale_down_unready_time as i64)
        };
        if now - since < threshold {
            continue;
        }
        let Some(group_id) = ctx.provider.node_group_for_node(node) else {
            continue;
        };
        let Some(group) = ctx.provider.node_group(&group_id) else {
            continue;
        };
        if group.target_size() <= group.min_size {
            continue;
        }
        eligible.push(name.clone());
    }

    if eligible.is_empty() {
        return Ok(ScaleDownOutcome::NoUnneeded);
    }

    let (empty, non_empty): (Vec<String>, Vec<String>) = eligible.into_iter().partition(|name| {
        snapshot
            .by_name
            .get(name)
            .map(|s| s.placed.iter().all(|p| p.is_daemonset_or_mirror()))
            .unwrap_or(false)
    });

    // Bulk empty-node deletion runs first (Open Question i).
    if !empty.is_empty() {
        let mut by_group: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for name in empty.into_iter().take(ctx.options.max_empty_bulk_delete as usize) {
            let Some(node) = nodes_by_name.get(&name) else {
                continue;
            };
            if let Some(group_id) = ctx.provider.node_group_for_node(node) {
                by_group.entry(group_id).or_default().push(name);
            }
        }
        let mut deleted = Vec::new();
        for (group_id, names) in &by_group {
            match ctx.provider.delete_nodes(group_id, names) {
                Ok(()) => deleted.extend(names.clone()),
                Err(e) => {
                    ctx.events.emit(AutoscalerEvent::Error { message: e.to_string() });
                    return Ok(ScaleDownOutcome::Error(e.to_string()));
                }
            }
        }
        if !deleted.is_empty() {
            ctx.events.emit(AutoscalerEvent::ScaleDownEmpty { nodes: deleted.clone() });
            tracker.clear();
            return Ok(ScaleDownOutcome::NodeDeleted(deleted));
        }
    }

    // Detailed single-node check.
    for candidate in &non_empty {
        let mut hints = BTreeMap::new();
        if !can_relocate_all(ctx, &snapshot, candidate, &mut hints, true) {
            continue;
        }
        let Some(node) = nodes_by_name.get(candidate) else {
            continue;
        };
        let Some(group_id) = ctx.provider.node_group_for_node(node) else {
            continue;
        };

        ctx.orchestrator.taint_node_unschedulable(candidate)?;
        let pods = ctx.orchestrator.pods_on_node(candidate)?;
        let classifier = DrainClassifier::new(
            ctx.options.skip_nodes_with_system_pods,
            ctx.options.skip_nodes_with_local_storage,
        );
        let pdbs = ctx.orchestrator.list_pod_disruption_budgets().unwrap_or_default();
        if let Ok(plan) = classifier.classify(&pods, &pdbs) {
            for pod in &plan.evictable {
                ctx.orchestrator.delete_pod(
                    &pod.metadata.namespace,
                    &pod.metadata.name,
                    ctx.options.max_graceful_termination_sec,
                )?;
            }
        }

        match ctx.provider.delete_nodes(&group_id, std::slice::from_ref(candidate)) {
            Ok(()) => {
                ctx.events.emit(AutoscalerEvent::NodeDeleted { node: candidate.clone() });
                tracker.clear();
                return Ok(ScaleDownOutcome::NodeDeleted(vec![candidate.clone()]));
            }
            Err(e) => {
                ctx.events.emit(AutoscalerEvent::Error { message: e.to_string() });
                return Ok(ScaleDownOutcome::Error(e.to_string()));
            }
        }
    }

    ctx.events.emit(AutoscalerEvent::NoNodeDeleted);
    Ok(ScaleDownOutcome::NoNodeDeleted)
}
