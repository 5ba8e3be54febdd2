//! `OrchestratorClient` trait contract (§6), plus a deterministic
//! in-memory fake. Grounded in the reconciling-store shape of the
//! teacher's `core/persistent_storage.rs`.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::core::node::Node;
use crate::core::pod::Pod;
use crate::error::CaResult;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PodDisruptionBudget {
    pub name: String,
    pub selector_label: (String, String),
    pub allowed_disruptions: u32,
}

pub trait OrchestratorClient: Send + Sync {
    fn list_nodes(&self) -> CaResult<Vec<Node>>;
    fn list_unscheduled_pods(&self) -> CaResult<Vec<Pod>>;
    fn list_scheduled_pods(&self) -> CaResult<Vec<Pod>>;
    fn list_pod_disruption_budgets(&self) -> CaResult<Vec<PodDisruptionBudget>>;

    fn pods_on_node(&self, node_name: &str) -> CaResult<Vec<Pod>>;

    fn taint_node_unschedulable(&self, node_name: &str) -> CaResult<()>;
    fn delete_pod(&self, namespace: &str, name: &str, grace_period_sec: u64) -> CaResult<()>;

    fn record_event(&self, subject: &str, reason: &str, message: &str);
}

#[derive(Default)]
pub struct FakeOrchestratorClient {
    nodes: Mutex<BTreeMap<String, Node>>,
    pods: Mutex<BTreeMap<String, Pod>>,
    pdbs: Mutex<Vec<PodDisruptionBudget>>,
    events: Mutex<Vec<(String, String, String)>>,
}

impl FakeOrchestratorClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_node(&self, node: Node) {
        self.nodes.lock().insert(node.metadata.name.clone(), node);
    }

    pub fn put_pod(&self, pod: Pod) {
        let key = format!("{}/{}", pod.metadata.namespace, pod.metadata.name);
        self.pods.lock().insert(key, pod);
    }

    pub fn put_pdb(&self, pdb: PodDisruptionBudget) {
        self.pdbs.lock().push(pdb);
    }

    pub fn events(&self) -> Vec<(String, String, String)> {
        self.events.lock().clone()
    }
}

impl OrchestratorClient for FakeOrchestratorClient {
    fn list_nodes(&self) -> CaResult<Vec<Node>> {
        Ok(self.nodes.lock().values().cloned().collect())
    }

    fn list_unscheduled_pods(&self) -> CaResult<Vec<Pod>> {
        Ok(self
            .pods
            .lock()
            .values()
            .filter(|p| p.is_unschedulable())
            .cloned()
            .collect())
    }

    fn list_scheduled_pods(&self) -> CaResult<Vec<Pod>> {
        Ok(self
            .pods
            .lock()
            .values()
            .filter(|p| p.spec.node_name.is_some())
            .cloned()
            .collect())
    }

    fn list_pod_disruption_budgets(&self) -> CaResult<Vec<PodDisruptionBudget>> {
        Ok(self.pdbs.lock().clone())
    }

    fn pods_on_node(&self, node_name: &str) -> CaResult<Vec<Pod>> {
        Ok(self
            .pods
            .lock()
            .values()
            .filter(|p| p.spec.node_name.as_deref() == Some(node_name))
            .cloned()
            .collect())
    }

    fn taint_node_unschedulable(&self, node_name: &str) -> CaResult<()> {
        if let Some(node) = self.nodes.lock().get_mut(node_name) {
            node.spec.unschedulable = true;
        }
        Ok(())
    }

    fn delete_pod(&self, namespace: &str, name: &str, _grace_period_sec: u64) -> CaResult<()> {
        self.pods.lock().remove(&format!("{namespace}/{name}"));
        Ok(())
    }

    fn record_event(&self, subject: &str, reason: &str, message: &str) {
        self.events
            .lock()
            .push((subject.to_string(), reason.to_string(), message.to_string()));
    }
}
