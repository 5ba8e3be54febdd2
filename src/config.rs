//! Config field definitions for the autoscaler, layered the way the
//! teacher's simulation config is: a `serde`-deserialized struct with
//! free-function defaults, optionally overlaid by CLI flags.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Deserialize;

use crate::cli::Cli;
use crate::core::estimator::EstimatorKind;
use crate::core::expander::ExpanderKind;
use crate::error::{CaError, CaResult};

fn scan_interval_default() -> f64 {
    10.0
}
fn scale_down_enabled_default() -> bool {
    true
}
fn scale_down_delay_default() -> f64 {
    600.0
}
fn scale_down_unneeded_time_default() -> f64 {
    600.0
}
fn scale_down_unready_time_default() -> f64 {
    1200.0
}
fn scale_down_utilization_threshold_default() -> f64 {
    0.5
}
fn scale_down_trial_interval_default() -> f64 {
    60.0
}
fn max_nodes_total_default() -> u64 {
    0
}
fn max_node_provision_time_default() -> f64 {
    900.0
}
fn max_total_unready_percentage_default() -> f64 {
    45.0
}
fn ok_total_unready_count_default() -> u64 {
    3
}
fn max_graceful_termination_sec_default() -> u64 {
    600
}
fn max_empty_bulk_delete_default() -> u64 {
    10
}
fn estimator_default() -> EstimatorKind {
    EstimatorKind::Binpacking
}
fn expander_default() -> ExpanderKind {
    ExpanderKind::Random
}
fn unregistered_node_removal_time_default() -> f64 {
    900.0
}

/// Mirrors the teacher's `ClusterAutoscalerConfig`: one `#[serde(default)]`
/// field per tunable, each backed by a free function default.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[allow(dead_code)]
pub struct AutoscalerOptions {
    #[serde(default = "scan_interval_default")]
    pub scan_interval: f64,
    #[serde(default = "scale_down_enabled_default")]
    pub scale_down_enabled: bool,
    #[serde(default = "scale_down_delay_default")]
    pub scale_down_delay: f64,
    #[serde(default = "scale_down_unneeded_time_default")]
    pub scale_down_unneeded_time: f64,
    #[serde(default = "scale_down_unready_time_default")]
    pub scale_down_unready_time: f64,
    #[serde(default = "scale_down_utilization_threshold_default")]
    pub scale_down_utilization_threshold: f64,
    #[serde(default = "scale_down_trial_interval_default")]
    pub scale_down_trial_interval: f64,
    #[serde(default = "max_nodes_total_default")]
    pub max_nodes_total: u64,
    #[serde(default = "max_node_provision_time_default")]
    pub max_node_provision_time: f64,
    #[serde(default = "max_total_unready_percentage_default")]
    pub max_total_unready_percentage: f64,
    #[serde(default = "ok_total_unready_count_default")]
    pub ok_total_unready_count: u64,
    #[serde(default = "max_graceful_termination_sec_default")]
    pub max_graceful_termination_sec: u64,
    #[serde(default = "max_empty_bulk_delete_default")]
    pub max_empty_bulk_delete: u64,
    #[serde(default = "estimator_default")]
    pub estimator: EstimatorKind,
    #[serde(default = "expander_default")]
    pub expander: ExpanderKind,
    #[serde(default = "unregistered_node_removal_time_default")]
    pub unregistered_node_removal_time: f64,
    #[serde(default)]
    pub skip_nodes_with_system_pods: bool,
    #[serde(default)]
    pub skip_nodes_with_local_storage: bool,
    #[serde(default)]
    pub verify_unschedulable_pods: bool,
    #[serde(default)]
    pub node_groups: Vec<NodeGroupSpec>,
}

impl Default for AutoscalerOptions {
    fn default() -> Self {
        Self {
            scan_interval: scan_interval_default(),
            scale_down_enabled: scale_down_enabled_default(),
            scale_down_delay: scale_down_delay_default(),
            scale_down_unneeded_time: scale_down_unneeded_time_default(),
            scale_down_unready_time: scale_down_unready_time_default(),
            scale_down_utilization_threshold: scale_down_utilization_threshold_default(),
            scale_down_trial_interval: scale_down_trial_interval_default(),
            max_nodes_total: max_nodes_total_default(),
            max_node_provision_time: max_node_provision_time_default(),
            max_total_unready_percentage: max_total_unready_percentage_default(),
            ok_total_unready_count: ok_total_unready_count_default(),
            max_graceful_termination_sec: max_graceful_termination_sec_default(),
            max_empty_bulk_delete: max_empty_bulk_delete_default(),
            estimator: estimator_default(),
            expander: expander_default(),
            unregistered_node_removal_time: unregistered_node_removal_time_default(),
            skip_nodes_with_system_pods: false,
            skip_nodes_with_local_storage: false,
            verify_unschedulable_pods: false,
            node_groups: Vec::new(),
        }
    }
}

impl AutoscalerOptions {
    /// Startup validation. Failures here are always fatal, matching the
    /// teacher's panic-on-bad-config startup style.
    pub fn validate(&self) -> CaResult<()> {
        if self.scan_interval <= 0.0 {
            return Err(CaError::InvalidConfig(
                "scan_interval must be positive".into(),
            ));
        }
        if self.node_groups.is_empty() {
            return Err(CaError::InvalidConfig(
                "at least one node group must be configured".into(),
            ));
        }
        for group in &self.node_groups {
            group.validate()?;
        }
        Ok(())
    }

    /// Overlay CLI flags on top of whatever was loaded from the config
    /// file, giving the CLI the final word, the way the teacher's binary
    /// composes `clap` flags over `SimulationConfig`.
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        if let Some(v) = cli.scan_interval {
            self.scan_interval = v;
        }
        if let Some(v) = cli.scale_down_enabled {
            self.scale_down_enabled = v;
        }
        if let Some(v) = cli.scale_down_delay {
            self.scale_down_delay = v;
        }
        if let Some(v) = cli.scale_down_unneeded_time {
            self.scale_down_unneeded_time = v;
        }
        if let Some(v) = cli.scale_down_unready_time {
            self.scale_down_unready_time = v;
        }
        if let Some(v) = cli.scale_down_utilization_threshold {
            self.scale_down_utilization_threshold = v;
        }
        if let Some(v) = cli.scale_down_trial_interval {
            self.scale_down_trial_interval = v;
        }
        if let Some(v) = cli.max_nodes_total {
            self.max_nodes_total = v;
        }
        if let Some(v) = cli.max_node_provision_time {
            self.max_node_provision_time = v;
        }
        if let Some(v) = cli.max_total_unready_percentage {
            self.max_total_unready_percentage = v;
        }
        if let Some(v) = cli.ok_total_unready_count {
            self.ok_total_unready_count = v;
        }
        if let Some(v) = cli.max_graceful_termination_sec {
            self.max_graceful_termination_sec = v;
        }
        if let Some(v) = cli.max_empty_bulk_delete {
            self.max_empty_bulk_delete = v;
        }
        if let Some(v) = cli.estimator {
            self.estimator = v;
        }
        if let Some(v) = cli.expander {
            self.expander = v;
        }
        if let Some(v) = cli.unregistered_node_removal_time {
            self.unregistered_node_removal_time = v;
        }
        if cli.skip_nodes_with_system_pods {
            self.skip_nodes_with_system_pods = true;
        }
        if cli.skip_nodes_with_local_storage {
            self.skip_nodes_with_local_storage = true;
        }
        if cli.verify_unschedulable_pods {
            self.verify_unschedulable_pods = true;
        }
        for spec in &cli.node_groups {
            if let Some(parsed) = NodeGroupSpec::parse(spec) {
                self.node_groups.push(parsed);
            }
        }
        self
    }
}

/// `min:max:identifier`, the `--node-groups` CLI shape from the external
/// interfaces section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeGroupSpec {
    pub min_size: u64,
    pub max_size: u64,
    pub identifier: String,
}

impl NodeGroupSpec {
    pub fn validate(&self) -> CaResult<()> {
        if self.min_size < 1 || self.min_size > self.max_size || self.identifier.is_empty() {
            return Err(CaError::InvalidConfig(format!(
                "invalid node group spec {}:{}:{}",
                self.min_size, self.max_size, self.identifier
            )));
        }
        Ok(())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(3, ':');
        let min_size = parts.next()?.parse().ok()?;
        let max_size = parts.next()?.parse().ok()?;
        let identifier = parts.next()?.to_string();
        Some(Self {
            min_size,
            max_size,
            identifier,
        })
    }
}

/// Top-level file passed via `--config`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AutoscalerConfig {
    #[serde(default)]
    pub options: AutoscalerOptions,
    /// If not set, logs default to stdout/stderr.
    pub logs_filepath: Option<String>,
    pub status_output_path: Option<PathBuf>,
}

impl Default for AutoscalerConfig {
    fn default() -> Self {
        Self {
            options: AutoscalerOptions::default(),
            logs_filepath: None,
            status_output_path: None,
        }
    }
}

impl AutoscalerConfig {
    pub fn load(path: &Path) -> CaResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CaError::InvalidConfig(format!("reading {}: {e}", path.display())))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| CaError::InvalidConfig(format!("parsing {}: {e}", path.display())))
    }
}

/// Models "dynamic reconfiguration from a ConfigMap": a trait hook with one
/// real implementation that polls a file's mtime. On a detected change the
/// whole autoscaling context is rebuilt, never patched in place.
pub trait ConfigSource: Send + Sync {
    fn poll(&mut self) -> CaResult<Option<AutoscalerConfig>>;
}

pub struct FileConfigSource {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl FileConfigSource {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            last_modified: None,
        }
    }
}

impl ConfigSource for FileConfigSource {
    fn poll(&mut self) -> CaResult<Option<AutoscalerConfig>> {
        let metadata = match std::fs::metadata(&self.path) {
            Ok(m) => m,
            Err(_) => return Ok(None),
        };
        let modified = metadata.modified().ok();
        if modified.is_some() && modified == self.last_modified {
            return Ok(None);
        }
        self.last_modified = modified;
        Ok(Some(AutoscalerConfig::load(&self.path)?))
    }
}
