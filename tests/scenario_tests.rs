//! Black-box scenario tests built against the deterministic in-memory
//! fakes, in the style of the teacher's `test_util::helpers` full-harness
//! assertions.

use std::sync::Arc;

use chrono::Utc;

use rustautoscaler::common::Resources;
use rustautoscaler::config::AutoscalerOptions;
use rustautoscaler::core::cloud_provider::{CloudProvider, FakeCloudProvider};
use rustautoscaler::core::context::AutoscalingContext;
use rustautoscaler::core::control_loop::ControlLoop;
use rustautoscaler::core::events::EventRecorder;
use rustautoscaler::core::node::Node;
use rustautoscaler::core::node_group::NodeGroup;
use rustautoscaler::core::options::ScaleDownOutcome;
use rustautoscaler::core::orchestrator::{FakeOrchestratorClient, OrchestratorClient, PodDisruptionBudget};
use rustautoscaler::core::pod::{OwnerKind, Pod};
use rustautoscaler::core::scale_down::{self, UnneededTracker};
use rustautoscaler::core::scale_up::{self, ScaleUpOutcome};

fn silent_events() -> EventRecorder {
    let (recorder, receiver) = EventRecorder::channel();
    std::thread::spawn(move || for _ in receiver {});
    recorder
}

fn replicated_pod(name: &str, node: &str, requests: Resources) -> Pod {
    let mut pod = Pod::new(name, requests);
    pod.spec.node_name = Some(node.to_string());
    pod.spec.owner_kind = Some(OwnerKind::ReplicaSet);
    pod.spec.owner_replicas = Some(3);
    pod.spec.owner_min_replicas = Some(1);
    pod
}

fn unschedulable_pod(name: &str, requests: Resources) -> Pod {
    let mut pod = Pod::new(name, requests);
    pod.status.conditions.push(rustautoscaler::common::Condition {
        kind: "PodScheduled".to_string(),
        status: rustautoscaler::common::ConditionStatus::False,
        reason: "Unschedulable".to_string(),
        message: String::new(),
        last_transition_time: Utc::now(),
    });
    pod
}

/// S1: basic scale-up. Two full nodes, three unschedulable pods that all
/// fit on a single fresh template node: the group's target grows by one.
#[test]
fn s1_basic_scale_up() {
    let mut provider = FakeCloudProvider::new();
    let group = NodeGroup::new("group-a", 1, 10, 2);
    let template = Node::new("group-a-template", Resources::new(2000, 4 * 1024 * 1024 * 1024));
    provider.add_group(group, template, vec!["group-a-0".to_string(), "group-a-1".to_string()]);
    let provider: Arc<dyn CloudProvider> = Arc::new(provider);

    let orchestrator = Arc::new(FakeOrchestratorClient::new());
    let full = Resources::new(1000, 2 * 1024 * 1024 * 1024);
    orchestrator.put_node(Node::new("group-a-0", full));
    orchestrator.put_node(Node::new("group-a-1", full));
    orchestrator.put_pod(replicated_pod("occupant-0", "group-a-0", full));
    orchestrator.put_pod(replicated_pod("occupant-1", "group-a-1", full));

    let unschedulable: Vec<Pod> = (0..3)
        .map(|i| unschedulable_pod(&format!("pending-{i}"), Resources::new(400, 500 * 1024 * 1024)))
        .collect();
    for pod in &unschedulable {
        orchestrator.put_pod(pod.clone());
    }

    let options = AutoscalerOptions {
        node_groups: vec![],
        ..AutoscalerOptions::default()
    };
    let ctx = AutoscalingContext::new(options, provider.clone(), orchestrator, silent_events());

    let all_nodes = vec![Node::new("group-a-0", full), Node::new("group-a-1", full)];
    let outcome = scale_up::scale_up(&ctx, &unschedulable, &all_nodes, Utc::now()).unwrap();

    match outcome {
        ScaleUpOutcome::Scaled { node_group_id, increase } => {
            assert_eq!(node_group_id, "group-a");
            assert_eq!(increase, 1);
        }
        _ => panic!("expected a scale-up"),
    }
    assert_eq!(provider.node_group("group-a").unwrap().target_size(), 3);
}

/// S4: scale-down basic. A low-utilization node hosting a replicated pod
/// gets drained onto its neighbor and deleted.
#[test]
fn s4_scale_down_basic() {
    let mut provider = FakeCloudProvider::new();
    let group = NodeGroup::new("group-a", 1, 10, 2);
    let capacity = Resources::new(1000, 1024 * 1024 * 1024);
    let template = Node::new("group-a-template", capacity);
    provider.add_group(group, template, vec!["n1".to_string(), "n2".to_string()]);
    let provider: Arc<dyn CloudProvider> = Arc::new(provider);

    let orchestrator = Arc::new(FakeOrchestratorClient::new());
    orchestrator.put_node(Node::new("n1", capacity));
    orchestrator.put_node(Node::new("n2", capacity));
    orchestrator.put_pod(replicated_pod("p1", "n1", Resources::new(100, 100 * 1024 * 1024)));
    orchestrator.put_pod(replicated_pod("p2", "n2", Resources::new(800, 800 * 1024 * 1024)));

    let mut options = AutoscalerOptions::default();
    options.scale_down_utilization_threshold = 0.5;
    options.scale_down_unneeded_time = 60.0;
    let ctx = AutoscalingContext::new(options, provider.clone(), orchestrator, silent_events());
    *ctx.last_scale_up_time.lock() = Some(Utc::now() - chrono::Duration::minutes(5));

    let all_nodes = vec![Node::new("n1", capacity), Node::new("n2", capacity)];
    let mut tracker = UnneededTracker::default();
    let t0 = Utc::now() - chrono::Duration::minutes(2);
    scale_down::update_unneeded_nodes(&ctx, &mut tracker, &all_nodes, t0).unwrap();
    assert!(tracker.since("n1").is_some());
    assert!(tracker.since("n2").is_none());

    let t1 = Utc::now();
    scale_down::update_unneeded_nodes(&ctx, &mut tracker, &all_nodes, t1).unwrap();
    let outcome = scale_down::try_to_scale_down(&ctx, &mut tracker, &all_nodes, t1).unwrap();

    match outcome {
        ScaleDownOutcome::NodeDeleted(nodes) => assert_eq!(nodes, vec!["n1".to_string()]),
        other => panic!("expected NodeDeleted, got {other:?}"),
    }
    assert!(tracker.is_empty());
}

/// PDB safety: a node whose only evictable pod is covered by a
/// zero-disruption-budget PDB is never selected for deletion.
#[test]
fn pdb_blocks_single_node_deletion() {
    let mut provider = FakeCloudProvider::new();
    let group = NodeGroup::new("group-a", 1, 10, 2);
    let capacity = Resources::new(1000, 1024 * 1024 * 1024);
    let template = Node::new("group-a-template", capacity);
    provider.add_group(group, template, vec!["n1".to_string(), "n2".to_string()]);
    let provider: Arc<dyn CloudProvider> = Arc::new(provider);

    let orchestrator = Arc::new(FakeOrchestratorClient::new());
    orchestrator.put_node(Node::new("n1", capacity));
    orchestrator.put_node(Node::new("n2", capacity));
    let mut p1 = replicated_pod("p1", "n1", Resources::new(100, 100 * 1024 * 1024));
    p1.metadata.labels.insert("app".to_string(), "web".to_string());
    orchestrator.put_pod(p1);
    orchestrator.put_pod(replicated_pod("p2", "n2", Resources::new(100, 100 * 1024 * 1024)));
    orchestrator.put_pdb(PodDisruptionBudget {
        name: "web-pdb".to_string(),
        selector_label: ("app".to_string(), "web".to_string()),
        allowed_disruptions: 0,
    });

    let mut options = AutoscalerOptions::default();
    options.scale_down_utilization_threshold = 0.9;
    options.scale_down_unneeded_time = 0.0;
    let ctx = AutoscalingContext::new(options, provider.clone(), orchestrator, silent_events());
    *ctx.last_scale_up_time.lock() = Some(Utc::now() - chrono::Duration::minutes(30));

    let all_nodes = vec![Node::new("n1", capacity), Node::new("n2", capacity)];
    let mut tracker = UnneededTracker::default();
    let now = Utc::now();
    scale_down::update_unneeded_nodes(&ctx, &mut tracker, &all_nodes, now).unwrap();
    let outcome = scale_down::try_to_scale_down(&ctx, &mut tracker, &all_nodes, now).unwrap();
    assert_eq!(outcome, ScaleDownOutcome::NoNodeDeleted);
}

#[test]
fn orchestrator_fake_reconciles_taints() {
    let orchestrator = FakeOrchestratorClient::new();
    orchestrator.put_node(Node::new("n1", Resources::new(100, 100)));
    orchestrator.taint_node_unschedulable("n1").unwrap();
    let nodes = orchestrator.list_nodes().unwrap();
    assert!(nodes[0].spec.unschedulable);
}

/// S6: an unready node is never treated as a valid relocation target, so a
/// low-utilization node whose only other neighbor is unready stays needed.
#[test]
fn s6_unready_neighbor_blocks_relocation() {
    let mut provider = FakeCloudProvider::new();
    let group = NodeGroup::new("group-a", 1, 10, 2);
    let capacity = Resources::new(1000, 1024 * 1024 * 1024);
    let template = Node::new("group-a-template", capacity);
    provider.add_group(group, template, vec!["n1".to_string(), "n2".to_string()]);
    let provider: Arc<dyn CloudProvider> = Arc::new(provider);

    let orchestrator = Arc::new(FakeOrchestratorClient::new());
    orchestrator.put_node(Node::new("n1", capacity));
    let mut n2 = Node::new("n2", capacity);
    n2.status.conditions.clear();
    n2.status.conditions.push(rustautoscaler::common::Condition {
        kind: "Ready".to_string(),
        status: rustautoscaler::common::ConditionStatus::False,
        reason: "NodeStatusUnknown".to_string(),
        message: String::new(),
        last_transition_time: Utc::now(),
    });
    orchestrator.put_node(n2.clone());
    orchestrator.put_pod(replicated_pod("p1", "n1", Resources::new(100, 100 * 1024 * 1024)));

    let mut options = AutoscalerOptions::default();
    options.scale_down_utilization_threshold = 0.5;
    options.scale_down_unneeded_time = 0.0;
    let ctx = AutoscalingContext::new(options, provider.clone(), orchestrator, silent_events());
    *ctx.last_scale_up_time.lock() = Some(Utc::now() - chrono::Duration::minutes(30));

    let all_nodes = vec![Node::new("n1", capacity), n2];
    let mut tracker = UnneededTracker::default();
    let now = Utc::now();
    scale_down::update_unneeded_nodes(&ctx, &mut tracker, &all_nodes, now).unwrap();
    assert!(tracker.is_empty());
    let outcome = scale_down::try_to_scale_down(&ctx, &mut tracker, &all_nodes, now).unwrap();
    assert_eq!(outcome, ScaleDownOutcome::NoUnneeded);
}

#[test]
fn control_loop_tick_is_idempotent_with_no_pressure() {
    let mut provider = FakeCloudProvider::new();
    let group = NodeGroup::new("group-a", 1, 10, 1);
    let capacity = Resources::new(1000, 1024 * 1024 * 1024);
    let template = Node::new("group-a-template", capacity);
    provider.add_group(group, template, vec!["n1".to_string()]);
    let provider: Arc<dyn CloudProvider> = Arc::new(provider);

    let orchestrator = Arc::new(FakeOrchestratorClient::new());
    orchestrator.put_node(Node::new("n1", capacity));
    orchestrator.put_pod(replicated_pod("p1", "n1", Resources::new(500, 500 * 1024 * 1024)));

    let options = AutoscalerOptions::default();
    let ctx = Arc::new(AutoscalingContext::new(options, provider, orchestrator, silent_events()));
    let mut control_loop = ControlLoop::new(ctx);

    control_loop.tick().unwrap();
    control_loop.tick().unwrap();
}
