//! Centralized storage for internal metrics. Any component may report
//! through this collector; adapted from the teacher's
//! `metrics/collector.rs`, trimmed to what a real (non-simulated)
//! autoscaler process tracks: scaling counts and loop-iteration timing.

use average::{concatenate, Estimate, Max, Mean, Min, Variance};

concatenate!(
    Estimator,
    [Min, min],
    [Max, max],
    [Mean, mean],
    [Variance, population_variance]
);

#[derive(Default)]
pub struct EstimatorWrapper {
    estimator: Estimator,
}

impl std::fmt::Debug for Estimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Estimator")
            .field("min", &self.min)
            .field("max", &self.max)
            .field("mean", &self.mean)
            .field("population_variance", &self.population_variance)
            .finish()
    }
}

impl std::fmt::Debug for EstimatorWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.estimator.fmt(f)
    }
}

impl EstimatorWrapper {
    pub fn new() -> Self {
        Self {
            estimator: Estimator::new(),
        }
    }

    pub fn add(&mut self, value: f64) {
        self.estimator.add(value);
    }

    pub fn min(&self) -> f64 {
        self.estimator.min()
    }

    pub fn max(&self) -> f64 {
        self.estimator.max()
    }

    pub fn mean(&self) -> f64 {
        self.estimator.mean()
    }

    pub fn population_variance(&self) -> f64 {
        self.estimator.population_variance()
    }
}

impl PartialEq for EstimatorWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.min() == other.min()
            && self.max() == other.max()
            && self.mean() == other.mean()
            && self.population_variance() == other.population_variance()
    }
}

#[derive(Default)]
pub struct MetricsCollector {
    /// Total number of nodes added across all scale-up decisions.
    pub total_scaled_up_nodes: u64,
    /// Total number of nodes removed across all scale-down decisions.
    pub total_scaled_down_nodes: u64,
    /// Number of scale-up decisions that found no viable option.
    pub scale_up_no_op_count: u64,
    /// Number of scale-down ticks that found nothing eligible.
    pub scale_down_no_op_count: u64,
    /// Number of control-loop iterations that returned an error.
    pub failed_iterations: u64,

    /// Control-loop iteration wall-clock duration, in seconds.
    pub iteration_duration_stats: EstimatorWrapper,
    /// Time from a pod going unschedulable to it being accepted into a
    /// scale-up option, in seconds.
    pub scale_up_latency_stats: EstimatorWrapper,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_scale_up(&mut self, nodes_added: u64) {
        self.total_scaled_up_nodes += nodes_added;
    }

    pub fn record_scale_down(&mut self, nodes_removed: u64) {
        self.total_scaled_down_nodes += nodes_removed;
    }

    pub fn record_iteration_duration(&mut self, seconds: f64) {
        self.iteration_duration_stats.add(seconds);
    }

    pub fn record_scale_up_latency(&mut self, seconds: f64) {
        self.scale_up_latency_stats.add(seconds);
    }
}
