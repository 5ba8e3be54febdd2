//! Cluster-State Registry (Component D): tracks pending scale-ups,
//! unregistered nodes, and per-group size drift. Grounded in the
//! reconciling-store pattern of the teacher's `core/persistent_storage.rs`.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::core::cloud_provider::CloudProvider;
use crate::core::node::Node;
use crate::core::options::{PendingScaleUp, SizeDiscrepancy, UnregisteredNodeRecord};

#[derive(Default)]
struct RegistryState {
    pending_scale_ups: Vec<PendingScaleUp>,
    unregistered: BTreeMap<String, UnregisteredNodeRecord>,
    size_discrepancies: BTreeMap<String, SizeDiscrepancy>,
    unhealthy_groups: BTreeMap<String, bool>,
}

pub struct ClusterStateRegistry {
    state: Mutex<RegistryState>,
    size_drift_threshold: Duration,
}

impl ClusterStateRegistry {
    pub fn new(size_drift_threshold: Duration) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            size_drift_threshold,
        }
    }

    pub fn register_pending_scale_up(&self, req: PendingScaleUp) {
        self.state.lock().pending_scale_ups.push(req);
    }

    /// Reconciles observed node lists against pending scale-ups and
    /// unregistered-node tracking.
    pub fn update_nodes(
        &self,
        provider: &dyn CloudProvider,
        registered: &[Node],
        now: DateTime<Utc>,
    ) {
        let mut state = self.state.lock();

        // Retire satisfied or expired scale-up requests. `Mutex::lock()`
        // hands back a guard, and `state.pending_scale_ups.retain(...)`
        // borrows all of `*state` mutably for the duration of the call, so
        // the closure cannot also reach `state.unhealthy_groups` -- collect
        // the expired group ids first and mark them unhealthy afterwards.
        let registered_names: std::collections::BTreeSet<_> =
            registered.iter().map(|n| n.metadata.name.clone()).collect();

        let mut expired_groups = Vec::new();
        let pending = std::mem::take(&mut state.pending_scale_ups);
        state.pending_scale_ups = pending
            .into_iter()
            .filter(|req| {
                if now >= req.expected_add_by {
                    expired_groups.push(req.node_group_id.clone());
                    return false;
                }
                if let Some(group) = provider.node_group(&req.node_group_id) {
                    let observed = provider
                        .nodes_in_group(&req.node_group_id)
                        .map(|members| {
                            members
                                .iter()
                                .filter(|name| registered_names.contains(*name))
                                .count() as u64
                        })
                        .unwrap_or(0);
                    return observed < group.target_size();
                }
                true
            })
            .collect();
        for group_id in expired_groups {
            state_mark_unhealthy(&mut state.unhealthy_groups, &group_id);
        }

        // Track group size drift.
        for group_id in provider.node_groups() {
            let Some(group) = provider.node_group(&group_id) else {
                continue;
            };
            let current = provider
                .nodes_in_group(&group_id)
                .map(|v| v.len() as u64)
                .unwrap_or(0);
            let expected = group.target_size();
            if current != expected {
                state
                    .size_discrepancies
                    .entry(group_id.clone())
                    .or_insert(SizeDiscrepancy {
                        expected,
                        current,
                        first_observed_at: now,
                    });
            } else {
                state.size_discrepancies.remove(&group_id);
            }

            // Unregistered: provider knows of a node this group claims to
            // have, but the orchestrator has never listed it.
            if let Ok(provider_nodes) = provider.nodes_in_group(&group_id) {
                for pn in provider_nodes {
                    if !registered_names.contains(&pn) {
                        state
                            .unregistered
                            .entry(pn.clone())
                            .or_insert(UnregisteredNodeRecord {
                                provider_node: pn,
                                first_observed_at: now,
                            });
                    } else {
                        state.unregistered.remove(&pn);
                    }
                }
            }
        }
    }

    pub fn is_node_group_healthy(&self, group_id: &str) -> bool {
        !self
            .state
            .lock()
            .unhealthy_groups
            .get(group_id)
            .copied()
            .unwrap_or(false)
    }

    pub fn upcoming_nodes(&self) -> BTreeMap<String, u64> {
        let mut result = BTreeMap::new();
        for req in &self.state.lock().pending_scale_ups {
            *result.entry(req.node_group_id.clone()).or_insert(0) += req.increase;
        }
        result
    }

    pub fn is_cluster_healthy(&self, total: u64, unready: u64, max_pct: f64, ok_floor: u64) -> bool {
        if total == 0 {
            return true;
        }
        let pct = (unready as f64 / total as f64) * 100.0;
        unready <= ok_floor || pct <= max_pct
    }

    pub fn unregistered_nodes_older_than(
        &self,
        now: DateTime<Utc>,
        age: Duration,
    ) -> Vec<UnregisteredNodeRecord> {
        self.state
            .lock()
            .unregistered
            .values()
            .filter(|r| now - r.first_observed_at >= age)
            .cloned()
            .collect()
    }

    pub fn remove_unregistered(&self, provider_node: &str) {
        self.state.lock().unregistered.remove(provider_node);
    }

    pub fn incorrect_node_group_size(&self, group_id: &str, now: DateTime<Utc>) -> Option<SizeDiscrepancy> {
        self.state
            .lock()
            .size_discrepancies
            .get(group_id)
            .filter(|d| now - d.first_observed_at >= self.size_drift_threshold)
            .cloned()
    }

    pub fn clear_size_discrepancy(&self, group_id: &str) {
        self.state.lock().size_discrepancies.remove(group_id);
    }
}

fn state_mark_unhealthy(unhealthy: &mut BTreeMap<String, bool>, group_id: &str) {
    unhealthy.insert(group_id.to_string(), true);
}
