use std::io::Write as _;
use std::sync::Arc;

use clap::Parser;
use file_rotate::{compression::Compression, suffix::AppendCount, ContentLimit, FileRotate};

use rustautoscaler::cli::Cli;
use rustautoscaler::config::AutoscalerConfig;
use rustautoscaler::core::cloud_provider::FakeCloudProvider;
use rustautoscaler::core::context::AutoscalingContext;
use rustautoscaler::core::control_loop::ControlLoop;
use rustautoscaler::core::events::EventRecorder;
use rustautoscaler::core::orchestrator::FakeOrchestratorClient;

fn init_logging(logs_filepath: &Option<String>, verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);

    if let Some(path) = logs_filepath {
        let rotating = FileRotate::new(
            path,
            AppendCount::new(5),
            ContentLimit::Bytes(10 * 1024 * 1024),
            Compression::None,
            None,
        );
        let rotating = std::sync::Mutex::new(rotating);
        builder.format(move |_, record| {
            let mut sink = rotating.lock().unwrap();
            writeln!(sink, "[{}] {}", record.level(), record.args())
        });
    }

    builder.init();
}

fn main() {
    let cli = Cli::parse();

    let file_config = cli
        .config
        .as_ref()
        .map(|path| AutoscalerConfig::load(path))
        .transpose()
        .unwrap_or_else(|e| {
            eprintln!("failed to load config: {e}");
            std::process::exit(1);
        })
        .unwrap_or_default();

    let logs_filepath = cli.logs_filepath.clone().or(file_config.logs_filepath.clone());
    init_logging(&logs_filepath, cli.verbose);

    let options = file_config.options.clone().merge_cli(&cli);
    if let Err(e) = options.validate() {
        log::error!("invalid configuration: {e}");
        std::process::exit(1);
    }

    // Real cloud-provider and orchestrator-client adapters are out of
    // scope; this binary wires the deterministic in-memory fakes so the
    // control loop is runnable end to end against whatever is registered
    // on them by an embedding application.
    let provider: Arc<dyn rustautoscaler::core::cloud_provider::CloudProvider> =
        Arc::new(FakeCloudProvider::new());
    let orchestrator: Arc<dyn rustautoscaler::core::orchestrator::OrchestratorClient> =
        Arc::new(FakeOrchestratorClient::new());

    let (events, receiver) = EventRecorder::channel();
    std::thread::spawn(move || {
        for event in receiver {
            log::debug!("delivered event: {event:?}");
        }
    });

    let ctx = Arc::new(AutoscalingContext::new(options, provider, orchestrator, events));

    log::info!("starting control loop, scan_interval={}s", ctx.options.scan_interval);
    let loop_handle = ControlLoop::new(ctx).spawn();
    let _ = loop_handle.join();
}
