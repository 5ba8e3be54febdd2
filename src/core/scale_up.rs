//! Scale-Up Planner (Component G). Grounded directly in the teacher's
//! `kube_cluster_autoscaler.rs::scale_up`, including the quota
//! short-circuit (`node_count_over_quota`).

use std::collections::BTreeMap;

use chrono::Duration;

use crate::core::context::AutoscalingContext;
use crate::core::events::AutoscalerEvent;
use crate::core::node::Node;
use crate::core::options::{ExpansionOption, PendingScaleUp};
use crate::core::pod::Pod;
use crate::core::snapshot::NodeSnapshot;
use crate::error::CaResult;

pub enum ScaleUpOutcome {
    NoOp,
    Scaled { node_group_id: String, increase: u64 },
    MaxReached,
}

pub fn scale_up(
    ctx: &AutoscalingContext,
    unschedulable: &[Pod],
    all_nodes: &[Node],
    now: chrono::DateTime<chrono::Utc>,
) -> CaResult<ScaleUpOutcome> {
    if unschedulable.is_empty() {
        return Ok(ScaleUpOutcome::NoOp);
    }

    if node_count_over_quota(ctx, all_nodes.len() as u64) {
        return Ok(ScaleUpOutcome::NoOp);
    }

    let mut templates: BTreeMap<String, Node> = BTreeMap::new();
    for group_id in ctx.provider.node_groups() {
        if let Some(template) = ctx.provider.template_node(&group_id) {
            templates.insert(group_id, template);
        }
    }

    let upcoming = ctx.registry.upcoming_nodes();

    let mut options: Vec<ExpansionOption> = Vec::new();
    let mut remaining_unschedulable: Vec<&Pod> = unschedulable.iter().collect();

    for (group_id, template) in &templates {
        let Some(group) = ctx.provider.node_group(group_id) else {
            continue;
        };
        if !ctx.registry.is_node_group_healthy(group_id) || group.is_at_max() {
            continue;
        }

        let snapshot = NodeSnapshot::new(template.clone(), vec![]);
        let mut accepted = Vec::new();
        for pod in &remaining_unschedulable {
            if ctx.predicate_checker.check(pod, &snapshot).is_ok() {
                accepted.push((*pod).clone());
            }
        }
        if accepted.is_empty() {
            continue;
        }

        let upcoming_for_group = upcoming.get(group_id).copied().unwrap_or(0);
        let node_count = ctx.estimator.estimate(&accepted, template, upcoming_for_group);
        if node_count == 0 {
            continue;
        }

        options.push(ExpansionOption {
            node_group_id: group_id.clone(),
            node_count,
            accepted_pods: accepted,
            debug: format!("group {group_id} accepts via {:?}", ctx.options.estimator),
        });
    }

    if options.is_empty() {
        for pod in &remaining_unschedulable {
            ctx.events.emit(AutoscalerEvent::NotTriggerScaleUp {
                pod: pod.metadata.name.clone(),
                reason: "no node group can accommodate this pod".to_string(),
            });
        }
        return Ok(ScaleUpOutcome::NoOp);
    }

    let best = match ctx.expander.best_option(&options, &templates, ctx.provider.as_ref()) {
        Some(b) => b,
        None => return Ok(ScaleUpOutcome::NoOp),
    };

    let Some(group) = ctx.provider.node_group(&best.node_group_id) else {
        return Ok(ScaleUpOutcome::NoOp);
    };

    let target = group.target_size();
    let max_total = ctx.options.max_nodes_total;
    let mut new_size = (target + best.node_count).min(group.max_size);
    if max_total > 0 {
        let cluster_wide_headroom = max_total.saturating_sub(all_nodes.len() as u64);
        new_size = new_size.min(target + cluster_wide_headroom);
    }

    if new_size <= target {
        return Ok(ScaleUpOutcome::MaxReached);
    }

    let increase = new_size - target;
    ctx.provider.increase_size(&best.node_group_id, increase)?;

    ctx.registry.register_pending_scale_up(PendingScaleUp {
        node_group_id: best.node_group_id.clone(),
        increase,
        issued_at: now,
        expected_add_by: now + Duration::seconds(ctx.options.max_node_provision_time as i64),
    });

    for pod in &best.accepted_pods {
        ctx.events.emit(AutoscalerEvent::TriggeredScaleUp {
            pod: pod.metadata.name.clone(),
            node_group: best.node_group_id.clone(),
        });
    }

    remaining_unschedulable.retain(|p| !best.accepted_pods.iter().any(|a| a.metadata.name == p.metadata.name));
    for pod in remaining_unschedulable {
        ctx.events.emit(AutoscalerEvent::NotTriggerScaleUp {
            pod: pod.metadata.name.clone(),
            reason: "not accepted by the chosen expansion option".to_string(),
        });
    }

    Ok(ScaleUpOutcome::Scaled {
        node_group_id: best.node_group_id.clone(),
        increase,
    })
}

fn node_count_over_quota(ctx: &AutoscalingContext, current_total: u64) -> bool {
    if ctx.options.max_nodes_total > 0 && current_total >= ctx.options.max_nodes_total {
        return true;
    }
    ctx.provider
        .node_groups()
        .iter()
        .all(|id| ctx.provider.node_group(id).map(|g| g.is_at_max()).unwrap_or(true))
}
