//! Status Reporter (Component L): condition summary + bounded log ring.
//! Grounded in the teacher's `metrics/printer.rs` dual-format (pretty
//! table / JSON) output style.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use prettytable::{row, Table};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConditionState {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCondition {
    pub state: ConditionState,
    pub message: String,
    pub last_probe_time: DateTime<Utc>,
    pub last_transition_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub level: String,
    pub message: String,
}

pub struct StatusReporter {
    pub cluster_health: StatusCondition,
    pub node_group_health: BTreeMap<String, StatusCondition>,
    pub node_group_scale_up: BTreeMap<String, StatusCondition>,
    pub node_group_scale_down: BTreeMap<String, StatusCondition>,
    log_ring: VecDeque<LogEntry>,
    max_entries: usize,
    max_age: chrono::Duration,
}

impl StatusReporter {
    pub fn new(max_entries: usize, max_age: chrono::Duration) -> Self {
        let now = Utc::now();
        Self {
            cluster_health: StatusCondition {
                state: ConditionState::Healthy,
                message: "ok".to_string(),
                last_probe_time: now,
                last_transition_time: now,
            },
            node_group_health: BTreeMap::new(),
            node_group_scale_up: BTreeMap::new(),
            node_group_scale_down: BTreeMap::new(),
            log_ring: VecDeque::new(),
            max_entries,
            max_age,
        }
    }

    pub fn record_log(&mut self, level: &str, message: impl Into<String>) {
        let now = Utc::now();
        self.log_ring.push_back(LogEntry {
            at: now,
            level: level.to_string(),
            message: message.into(),
        });
        while self.log_ring.len() > self.max_entries {
            self.log_ring.pop_front();
        }
        while let Some(front) = self.log_ring.front() {
            if now - front.at > self.max_age {
                self.log_ring.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn set_cluster_health(&mut self, state: ConditionState, message: impl Into<String>) {
        let now = Utc::now();
        let message = message.into();
        if self.cluster_health.state != state {
            self.cluster_health.last_transition_time = now;
        }
        self.cluster_health.state = state;
        self.cluster_health.message = message;
        self.cluster_health.last_probe_time = now;
    }

    pub fn as_pretty_table(&self) -> Table {
        let mut table = Table::new();
        table.add_row(row!["Condition", "State", "Message"]);
        table.add_row(row![
            "Cluster",
            format!("{:?}", self.cluster_health.state),
            self.cluster_health.message
        ]);
        for (group, cond) in &self.node_group_health {
            table.add_row(row![
                format!("NodeGroup/{group}/Health"),
                format!("{:?}", cond.state),
                cond.message
            ]);
        }
        table
    }

    pub fn as_json(&self) -> serde_json::Value {
        serde_json::json!({
            "cluster_health": serde_json::to_value(&self.cluster_health).unwrap(),
            "node_group_health": serde_json::to_value(&self.node_group_health).unwrap(),
            "node_group_scale_up": serde_json::to_value(&self.node_group_scale_up).unwrap(),
            "node_group_scale_down": serde_json::to_value(&self.node_group_scale_down).unwrap(),
            "recent_logs": serde_json::to_value(self.log_ring.iter().collect::<Vec<_>>()).unwrap(),
        })
    }
}
