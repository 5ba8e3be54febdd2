//! CLI surface, in the same `clap` derive style the teacher uses for its
//! own simulation binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::core::estimator::EstimatorKind;
use crate::core::expander::ExpanderKind;

#[derive(Debug, Parser)]
#[command(name = "rustautoscaler", about = "Resizes cloud node groups based on scheduling pressure and underutilization")]
pub struct Cli {
    /// Path to a YAML config file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write rotated logs to this file instead of stdout/stderr.
    #[arg(long)]
    pub logs_filepath: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[arg(long)]
    pub scan_interval: Option<f64>,
    #[arg(long)]
    pub scale_down_enabled: Option<bool>,
    #[arg(long)]
    pub scale_down_delay: Option<f64>,
    #[arg(long)]
    pub scale_down_unneeded_time: Option<f64>,
    #[arg(long)]
    pub scale_down_unready_time: Option<f64>,
    #[arg(long)]
    pub scale_down_utilization_threshold: Option<f64>,
    #[arg(long)]
    pub scale_down_trial_interval: Option<f64>,
    #[arg(long)]
    pub max_nodes_total: Option<u64>,
    #[arg(long)]
    pub max_node_provision_time: Option<f64>,
    #[arg(long)]
    pub max_total_unready_percentage: Option<f64>,
    #[arg(long)]
    pub ok_total_unready_count: Option<u64>,
    #[arg(long)]
    pub max_graceful_termination_sec: Option<u64>,
    #[arg(long)]
    pub max_empty_bulk_delete: Option<u64>,
    #[arg(long, value_enum)]
    pub estimator: Option<EstimatorKind>,
    #[arg(long, value_enum)]
    pub expander: Option<ExpanderKind>,
    #[arg(long)]
    pub unregistered_node_removal_time: Option<f64>,
    #[arg(long)]
    pub skip_nodes_with_system_pods: bool,
    #[arg(long)]
    pub skip_nodes_with_local_storage: bool,
    #[arg(long)]
    pub verify_unschedulable_pods: bool,

    /// `min:max:identifier`, repeatable.
    #[arg(long = "node-groups")]
    pub node_groups: Vec<String>,
}

impl ValueEnum for EstimatorKind {
    fn value_variants<'a>() -> &'a [Self] {
        &[EstimatorKind::Binpacking, EstimatorKind::Basic]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            EstimatorKind::Binpacking => clap::builder::PossibleValue::new("binpacking"),
            EstimatorKind::Basic => clap::builder::PossibleValue::new("basic"),
        })
    }
}

impl ValueEnum for ExpanderKind {
    fn value_variants<'a>() -> &'a [Self] {
        &[
            ExpanderKind::Random,
            ExpanderKind::MostPods,
            ExpanderKind::LeastWaste,
            ExpanderKind::LeastCost,
        ]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            ExpanderKind::Random => clap::builder::PossibleValue::new("random"),
            ExpanderKind::MostPods => clap::builder::PossibleValue::new("most-pods"),
            ExpanderKind::LeastWaste => clap::builder::PossibleValue::new("least-waste"),
            ExpanderKind::LeastCost => clap::builder::PossibleValue::new("least-cost"),
        })
    }
}
