//! Control Loop (Component I): ticks on a fixed period from its own OS
//! thread, translating the teacher's simulated `EventHandler`
//! tick-dispatch (`RunClusterAutoscalerCycle`) into a real wall-clock
//! loop per the concurrency model.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};

use crate::core::context::AutoscalingContext;
use crate::core::scale_down::{self, UnneededTracker};
use crate::core::scale_up::{self, ScaleUpOutcome};
use crate::core::status::ConditionState;
use crate::error::CaResult;

pub struct ControlLoop {
    ctx: Arc<AutoscalingContext>,
    unneeded: UnneededTracker,
    stop: Arc<AtomicBool>,
}

impl ControlLoop {
    pub fn new(ctx: Arc<AutoscalingContext>) -> Self {
        Self {
            ctx,
            unneeded: UnneededTracker::default(),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Spawn the loop on its own OS thread; returns a join handle.
    pub fn spawn(mut self) -> std::thread::JoinHandle<()> {
        std::thread::spawn(move || {
            let interval = StdDuration::from_secs_f64(self.ctx.options.scan_interval.max(0.01));
            while !self.stop.load(Ordering::SeqCst) {
                if let Err(e) = self.tick() {
                    log::warn!("control loop iteration failed: {e}");
                }
                std::thread::sleep(interval);
            }
        })
    }

    pub fn tick(&mut self) -> CaResult<()> {
        let now = Utc::now();
        let all_nodes = self.ctx.orchestrator.list_nodes()?;
        if all_nodes.is_empty() {
            log::warn!("no nodes observed this tick, skipping");
            return Ok(());
        }

        self.ctx.registry.update_nodes(self.ctx.provider.as_ref(), &all_nodes, now);

        let ready_count = all_nodes.iter().filter(|n| n.is_ready()).count() as u64;
        let unready_count = all_nodes.len() as u64 - ready_count;
        if !self.ctx.registry.is_cluster_healthy(
            all_nodes.len() as u64,
            unready_count,
            self.ctx.options.max_total_unready_percentage,
            self.ctx.options.ok_total_unready_count,
        ) {
            self.ctx.status.lock().set_cluster_health(
                ConditionState::Unhealthy,
                format!("{unready_count}/{} nodes unready", all_nodes.len()),
            );
            return Ok(());
        }
        self.ctx.status.lock().set_cluster_health(ConditionState::Healthy, "ok");

        let removal_age = Duration::seconds(self.ctx.options.unregistered_node_removal_time as i64);
        let stale = self.ctx.registry.unregistered_nodes_older_than(now, removal_age);
        if !stale.is_empty() {
            for record in &stale {
                if let Some(group_id) = self
                    .ctx
                    .provider
                    .node_groups()
                    .into_iter()
                    .find(|g| {
                        self.ctx
                            .provider
                            .nodes_in_group(g)
                            .map(|names| names.contains(&record.provider_node))
                            .unwrap_or(false)
                    })
                {
                    self.ctx
                        .provider
                        .delete_nodes(&group_id, std::slice::from_ref(&record.provider_node))?;
                    self.ctx.registry.remove_unregistered(&record.provider_node);
                }
            }
            return Ok(());
        }

        let mut shrunk_any = false;
        for group_id in self.ctx.provider.node_groups() {
            if let Some(drift) = self.ctx.registry.incorrect_node_group_size(&group_id, now) {
                self.ctx
                    .provider
                    .decrease_target_size(&group_id, drift.expected.saturating_sub(drift.current))?;
                self.ctx.registry.clear_size_discrepancy(&group_id);
                shrunk_any = true;
            }
        }
        if shrunk_any {
            return Ok(());
        }

        let unscheduled = self.ctx.orchestrator.list_unscheduled_pods()?;
        let latest_ready_at = all_nodes
            .iter()
            .filter(|n| n.is_ready())
            .filter_map(|n| n.metadata.creation_timestamp)
            .max();

        let mut unschedulable: Vec<_> = unscheduled
            .into_iter()
            .filter(|p| match (p.unschedulable_since(), latest_ready_at) {
                (Some(since), Some(ready)) => since >= ready,
                _ => true,
            })
            .collect();

        if self.ctx.options.verify_unschedulable_pods {
            let snapshots: std::collections::BTreeMap<_, _> = all_nodes
                .iter()
                .filter_map(|n| {
                    self.ctx
                        .orchestrator
                        .pods_on_node(&n.metadata.name)
                        .ok()
                        .map(|pods| {
                            (
                                n.metadata.name.clone(),
                                crate::core::snapshot::NodeSnapshot::new(n.clone(), pods),
                            )
                        })
                })
                .collect();
            unschedulable.retain(|p| self.ctx.predicate_checker.fits_any(p, &snapshots).is_none());
        }

        if self.ctx.options.max_nodes_total > 0 && all_nodes.len() as u64 >= self.ctx.options.max_nodes_total {
            unschedulable.clear();
        }

        match scale_up::scale_up(&self.ctx, &unschedulable, &all_nodes, now)? {
            ScaleUpOutcome::Scaled { .. } => {
                *self.ctx.last_scale_up_time.lock() = Some(now);
                return Ok(());
            }
            ScaleUpOutcome::NoOp | ScaleUpOutcome::MaxReached => {}
        }

        if !self.ctx.options.scale_down_enabled {
            return Ok(());
        }

        // Phase 1 always runs, regardless of unschedulable-pod presence
        // (Open Question ii).
        scale_down::update_unneeded_nodes(&self.ctx, &mut self.unneeded, &all_nodes, now)?;

        if !unschedulable.is_empty() {
            return Ok(());
        }

        let cooled_down_since_scale_up = self
            .ctx
            .last_scale_up_time
            .lock()
            .map(|t| now - t >= Duration::seconds(self.ctx.options.scale_down_delay as i64))
            .unwrap_or(true);
        let cooled_down_since_failure = self
            .ctx
            .last_scale_down_fail_time
            .lock()
            .map(|t| now - t >= Duration::seconds(self.ctx.options.scale_down_trial_interval as i64))
            .unwrap_or(true);

        if cooled_down_since_scale_up && cooled_down_since_failure {
            match scale_down::try_to_scale_down(&self.ctx, &mut self.unneeded, &all_nodes, now)? {
                crate::core::options::ScaleDownOutcome::Error(_) => {
                    *self.ctx.last_scale_down_fail_time.lock() = Some(now);
                }
                _ => {}
            }
        }

        Ok(())
    }
}
