use prettytable::{row, Table};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::Write, path::PathBuf};

use crate::metrics::collector::MetricsCollector;

#[derive(Debug, Default, Clone, Copy, Deserialize, PartialEq)]
pub enum OutputFormat {
    #[default]
    Json,
    PrettyTable,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct MetricsPrinterConfig {
    pub format: OutputFormat,
    pub output_file: PathBuf,
}

pub fn print_metrics(collector: &MetricsCollector, config: &MetricsPrinterConfig) -> std::io::Result<()> {
    match config.format {
        OutputFormat::PrettyTable => print_metrics_as_pretty_table(collector, &config.output_file),
        OutputFormat::Json => print_metrics_as_json(collector, &config.output_file),
    }
}

pub fn print_metrics_as_pretty_table(
    collector: &MetricsCollector,
    output_file: &PathBuf,
) -> std::io::Result<()> {
    let mut metrics_file = File::create(output_file)?;

    let mut aggregated_table = Table::new();
    aggregated_table.add_row(row!["Metric", "Count"]);
    aggregated_table.add_row(row!["Total scaled up nodes", collector.total_scaled_up_nodes]);
    aggregated_table.add_row(row![
        "Total scaled down nodes",
        collector.total_scaled_down_nodes
    ]);
    aggregated_table.add_row(row!["Scale-up no-op ticks", collector.scale_up_no_op_count]);
    aggregated_table.add_row(row![
        "Scale-down no-op ticks",
        collector.scale_down_no_op_count
    ]);
    aggregated_table.add_row(row!["Failed iterations", collector.failed_iterations]);

    let mut stats_table = Table::new();
    stats_table.add_row(row!["Metric", "Min", "Max", "Mean", "Variance"]);
    stats_table.add_row(row![
        "Iteration duration (s)",
        collector.iteration_duration_stats.min(),
        collector.iteration_duration_stats.max(),
        collector.iteration_duration_stats.mean(),
        collector.iteration_duration_stats.population_variance()
    ]);
    stats_table.add_row(row![
        "Scale-up latency (s)",
        collector.scale_up_latency_stats.min(),
        collector.scale_up_latency_stats.max(),
        collector.scale_up_latency_stats.mean(),
        collector.scale_up_latency_stats.population_variance()
    ]);

    aggregated_table.print(&mut metrics_file)?;
    stats_table.print(&mut metrics_file)?;
    Ok(())
}

#[derive(Serialize)]
struct MetricsJson {
    counters: Counters,
    timings: Timings,
}

#[derive(Serialize)]
struct Counters {
    total_scaled_up_nodes: u64,
    total_scaled_down_nodes: u64,
    scale_up_no_op_count: u64,
    scale_down_no_op_count: u64,
    failed_iterations: u64,
}

#[derive(Serialize)]
struct Timings {
    iteration_duration: TimingsStats,
    scale_up_latency: TimingsStats,
}

#[derive(Serialize)]
struct TimingsStats {
    min: f64,
    max: f64,
    mean: f64,
    variance: f64,
}

pub fn print_metrics_as_json(collector: &MetricsCollector, output_file: &PathBuf) -> std::io::Result<()> {
    let mut metrics_file = File::create(output_file)?;

    let metrics = MetricsJson {
        counters: Counters {
            total_scaled_up_nodes: collector.total_scaled_up_nodes,
            total_scaled_down_nodes: collector.total_scaled_down_nodes,
            scale_up_no_op_count: collector.scale_up_no_op_count,
            scale_down_no_op_count: collector.scale_down_no_op_count,
            failed_iterations: collector.failed_iterations,
        },
        timings: Timings {
            iteration_duration: TimingsStats {
                min: collector.iteration_duration_stats.min(),
                max: collector.iteration_duration_stats.max(),
                mean: collector.iteration_duration_stats.mean(),
                variance: collector.iteration_duration_stats.population_variance(),
            },
            scale_up_latency: TimingsStats {
                min: collector.scale_up_latency_stats.min(),
                max: collector.scale_up_latency_stats.max(),
                mean: collector.scale_up_latency_stats.mean(),
                variance: collector.scale_up_latency_stats.population_variance(),
            },
        },
    };

    let serialized_json = serde_json::to_string_pretty(&metrics)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    metrics_file.write_all(serialized_json.as_bytes())
}
