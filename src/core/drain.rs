//! Drain Classifier (Component C): partitions a node's workloads into
//! required / evictable / blocking, plus the PDB check. Grounded in the
//! pod lifecycle bookkeeping of the teacher's `core/scheduler/scheduler.rs`.

use crate::core::orchestrator::PodDisruptionBudget;
use crate::core::pod::Pod;
use crate::error::DrainBlockReason;

pub struct DrainPlan {
    pub required: Vec<Pod>,
    pub evictable: Vec<Pod>,
}

pub struct DrainClassifier {
    pub skip_nodes_with_system_pods: bool,
    pub skip_nodes_with_local_storage: bool,
}

impl DrainClassifier {
    pub fn new(skip_system_pods: bool, skip_local_storage: bool) -> Self {
        Self {
            skip_nodes_with_system_pods: skip_system_pods,
            skip_nodes_with_local_storage: skip_local_storage,
        }
    }

    /// Classify `pods` (all workloads currently placed on one node).
    /// Returns the first blocking reason found, if any, else the drain
    /// plan.
    pub fn classify(
        &self,
        pods: &[Pod],
        pdbs: &[PodDisruptionBudget],
    ) -> Result<DrainPlan, DrainBlockReason> {
        let mut required = Vec::new();
        let mut evictable = Vec::new();

        for pod in pods {
            if pod.is_daemonset_or_mirror() {
                required.push(pod.clone());
                continue;
            }
            if self.skip_nodes_with_system_pods && pod.is_system_pod() {
                return Err(DrainBlockReason::SystemPod);
            }
            if self.skip_nodes_with_local_storage && pod.has_local_storage() {
                return Err(DrainBlockReason::LocalStorage);
            }
            if !pod.is_replicated() {
                return Err(DrainBlockReason::Unreplicated);
            }
            evictable.push(pod.clone());
        }

        for pod in &evictable {
            if let Some(blocked) = self.pdb_blocks(pod, pdbs) {
                if blocked {
                    return Err(DrainBlockReason::PdbBlocked);
                }
            }
        }

        Ok(DrainPlan {
            required,
            evictable,
        })
    }

    fn pdb_blocks(&self, pod: &Pod, pdbs: &[PodDisruptionBudget]) -> Option<bool> {
        for pdb in pdbs {
            let (key, value) = &pdb.selector_label;
            if pod.metadata.labels.get(key) == Some(value) {
                return Some(pdb.allowed_disruptions == 0);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Resources;
    use crate::core::pod::OwnerKind;

    fn replicated_pod(name: &str) -> Pod {
        let mut pod = Pod::new(name, Resources::new(100, 100));
        pod.spec.owner_kind = Some(OwnerKind::ReplicaSet);
        pod.spec.owner_replicas = Some(3);
        pod.spec.owner_min_replicas = Some(1);
        pod
    }

    #[test]
    fn unreplicated_pod_blocks_drain() {
        let pod = Pod::new("standalone", Resources::new(100, 100));
        let classifier = DrainClassifier::new(false, false);
        assert_eq!(
            classifier.classify(&[pod], &[]).unwrap_err(),
            DrainBlockReason::Unreplicated
        );
    }

    #[test]
    fn replicated_pod_is_evictable() {
        let pod = replicated_pod("web-1");
        let classifier = DrainClassifier::new(false, false);
        let plan = classifier.classify(&[pod], &[]).unwrap();
        assert_eq!(plan.evictable.len(), 1);
        assert!(plan.required.is_empty());
    }

    #[test]
    fn pdb_with_zero_allowed_disruptions_blocks() {
        let mut pod = replicated_pod("web-1");
        pod.metadata.labels.insert("app".to_string(), "web".to_string());
        let pdb = PodDisruptionBudget {
            name: "web-pdb".to_string(),
            selector_label: ("app".to_string(), "web".to_string()),
            allowed_disruptions: 0,
        };
        let classifier = DrainClassifier::new(false, false);
        assert_eq!(
            classifier.classify(&[pod], &[pdb]).unwrap_err(),
            DrainBlockReason::PdbBlocked
        );
    }
}
