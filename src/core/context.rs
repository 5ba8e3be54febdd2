//! Autoscaling Context (Component J): an immutable bundle of options plus
//! handles passed to the planners. Grounded in the teacher's
//! `ClusterAutoscaler` proxy struct, which likewise just bundles handles
//! and dispatches to a chosen algorithm implementation.

use std::sync::Arc;

use chrono::Duration;
use parking_lot::Mutex;

use crate::config::AutoscalerOptions;
use crate::core::cloud_provider::CloudProvider;
use crate::core::estimator::{self, Estimator};
use crate::core::events::EventRecorder;
use crate::core::expander::{self, Expander};
use crate::core::orchestrator::OrchestratorClient;
use crate::core::predicates::PredicateChecker;
use crate::core::registry::ClusterStateRegistry;
use crate::core::status::StatusReporter;

pub struct AutoscalingContext {
    pub options: AutoscalerOptions,
    pub provider: Arc<dyn CloudProvider>,
    pub orchestrator: Arc<dyn OrchestratorClient>,
    pub predicate_checker: PredicateChecker,
    pub estimator: &'static dyn Estimator,
    pub expander: &'static dyn Expander,
    pub registry: ClusterStateRegistry,
    pub events: EventRecorder,
    pub status: Mutex<StatusReporter>,
    pub last_scale_up_time: Mutex<Option<chrono::DateTime<chrono::Utc>>>,
    pub last_scale_down_fail_time: Mutex<Option<chrono::DateTime<chrono::Utc>>>,
}

impl AutoscalingContext {
    pub fn new(
        options: AutoscalerOptions,
        provider: Arc<dyn CloudProvider>,
        orchestrator: Arc<dyn OrchestratorClient>,
        events: EventRecorder,
    ) -> Self {
        let estimator = estimator::resolve(options.estimator);
        let expander = expander::resolve(options.expander);
        Self {
            registry: ClusterStateRegistry::new(Duration::seconds(
                options.scale_down_trial_interval as i64,
            )),
            options,
            provider,
            orchestrator,
            predicate_checker: PredicateChecker,
            estimator,
            expander,
            events,
            status: Mutex::new(StatusReporter::new(50, Duration::minutes(15))),
            last_scale_up_time: Mutex::new(None),
            last_scale_down_fail_time: Mutex::new(None),
        }
    }
}
