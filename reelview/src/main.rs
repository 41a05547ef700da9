mod config;

use clap::{Args, Parser};
use config::{Config, ConfigError, LoggingConfig, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Parser)]
#[command(name = "reelview", version, about = "Video relay and account lookup services")]
enum CliCommand {
    /// Stream signed CDN videos through the forward proxy
    Relay(ServiceArgs),
    /// Serve profile, search and trending lookups
    Lookup(ServiceArgs),
    /// Print the metrics emitted by each service
    Metrics,
}

#[derive(Args)]
struct ServiceArgs {
    #[arg(long)]
    config_file_path: PathBuf,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("config file has no `{0}` section")]
    MissingSection(&'static str),
    #[error("invalid log filter: {0}")]
    LogFilter(#[from] tracing_subscriber::filter::ParseError),
    #[error("could not install logger: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
    #[error("could not set up metrics: {0}")]
    Metrics(String),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Relay(#[from] relay::RelayError),
    #[error(transparent)]
    Lookup(#[from] lookup::LookupError),
}

/// Everything a service needs before it starts serving.
struct Process {
    config: Config,
    runtime: Runtime,
    // Flushes pending events on drop
    _sentry: Option<sentry::ClientInitGuard>,
}

fn main() -> ExitCode {
    let cli = CliCommand::parse();

    let result = match &cli {
        CliCommand::Relay(args) => run_relay(args),
        CliCommand::Lookup(args) => run_lookup(args),
        CliCommand::Metrics => {
            print_metrics();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "exiting");
            eprintln!("reelview: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_relay(args: &ServiceArgs) -> Result<(), CliError> {
    let Process {
        config,
        runtime,
        _sentry,
    } = start(args)?;
    let relay_config = config.relay.ok_or(CliError::MissingSection("relay"))?;

    tracing::info!("starting reelview relay");
    runtime.block_on(relay::run(relay_config))?;
    Ok(())
}

fn run_lookup(args: &ServiceArgs) -> Result<(), CliError> {
    let Process {
        config,
        runtime,
        _sentry,
    } = start(args)?;
    let lookup_config = config.lookup.ok_or(CliError::MissingSection("lookup"))?;

    tracing::info!("starting reelview lookup");
    runtime.block_on(lookup::run(lookup_config))?;
    Ok(())
}

fn start(args: &ServiceArgs) -> Result<Process, CliError> {
    let config = Config::from_file(&args.config_file_path)?;

    let default_logging = LoggingConfig::default();
    let sentry = init_logging(config.common.logging.as_ref().unwrap_or(&default_logging))?;

    if let Some(metrics_config) = &config.common.metrics {
        init_metrics(metrics_config)?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    Ok(Process {
        config,
        runtime,
        _sentry: sentry,
    })
}

fn init_logging(config: &LoggingConfig) -> Result<Option<sentry::ClientInitGuard>, CliError> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(config.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL))
    })?;

    let sentry = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });
    let sentry_layer = sentry
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .try_init()?;

    Ok(sentry)
}

fn init_metrics(config: &MetricsConfig) -> Result<(), CliError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some(&config.prefix))
        .map_err(|e| CliError::Metrics(e.to_string()))?;

    metrics::set_global_recorder(recorder).map_err(|e| CliError::Metrics(e.to_string()))?;
    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        prefix = %config.prefix,
        "sending metrics to statsd"
    );
    Ok(())
}

fn print_metrics() {
    println!("## relay\n");
    println!("{}", shared::metrics_defs::describe(relay::metrics_defs::ALL_METRICS));
    println!("## lookup\n");
    println!("{}", shared::metrics_defs::describe(lookup::metrics_defs::ALL_METRICS));
}
