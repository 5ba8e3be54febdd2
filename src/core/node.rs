//! Node data model, grounded in the richer generation the teacher's own
//! integration tests assume (`ObjectMeta`/`NodeStatus`) rather than the
//! minimal `core/node.rs` shape used elsewhere in the teacher tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{Condition, ConditionStatus, ObjectMeta, Resources, Taint};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default)]
    pub taints: Vec<Taint>,
    #[serde(default)]
    pub unschedulable: bool,
    /// Name of the provider-side instance backing this node, used to join
    /// against `CloudProvider::node_group_for_node`.
    #[serde(default)]
    pub provider_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub allocatable: Resources,
    pub capacity: Resources,
    #[serde(default)]
    pub max_pods: u32,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl NodeStatus {
    pub fn is_ready(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| c.kind == "Ready" && c.status == ConditionStatus::True)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: NodeSpec,
    pub status: NodeStatus,
}

impl Node {
    pub fn new(name: impl Into<String>, resources: Resources) -> Self {
        Self {
            metadata: ObjectMeta::new(name),
            spec: NodeSpec::default(),
            status: NodeStatus {
                allocatable: resources,
                capacity: resources,
                max_pods: 110,
                conditions: vec![Condition {
                    kind: "Ready".to_string(),
                    status: ConditionStatus::True,
                    reason: "KubeletReady".to_string(),
                    message: String::new(),
                    last_transition_time: Utc::now(),
                }],
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status.is_ready()
    }

    /// Time since this node stopped being ready, if it currently isn't.
    pub fn unready_since(&self) -> Option<DateTime<Utc>> {
        if self.is_ready() {
            return None;
        }
        self.status
            .conditions
            .iter()
            .find(|c| c.kind == "Ready")
            .map(|c| c.last_transition_time)
    }
}
