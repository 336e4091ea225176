use clap::Parser;
use log::{error, info};
use questdrop_core::application::{reconcile, PipelineContext};
use questdrop_core::foundation::{QuestDropError, Result};
use questdrop_core::infrastructure::config::{load_config, load_config_from_file, AppConfig};
use questdrop_core::infrastructure::ledger::HttpLedgerClient;
use questdrop_core::infrastructure::logging::init_logger;
use questdrop_core::infrastructure::state::RocksStateStore;
use questdrop_core::infrastructure::store::RestObjectiveStore;
use questdrop_service::api::{run_http_server, AppState};
use questdrop_service::service::metrics::Metrics;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "questdrop")]
#[command(about = "Quest completion sync and airdrop service", long_about = None)]
struct Cli {
    /// Path to configuration file (default: <data-dir>/questdrop-config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory for durable state and default config location
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Log filter expression (e.g. "info", "questdrop_core=debug")
    #[arg(short, long)]
    log_filters: Option<String>,

    /// Run one bulk reconcile pass and exit instead of serving HTTP
    #[arg(long)]
    reconcile: bool,
}

fn load(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(path) => load_config_from_file(path, &cli.data_dir),
        None => load_config(&cli.data_dir),
    }
}

fn build_pipeline(config: &AppConfig) -> Result<PipelineContext> {
    let store = Arc::new(RestObjectiveStore::new(&config.store, config.service.call_timeout())?);
    let ledger = Arc::new(HttpLedgerClient::new(&config.ledger, config.service.call_timeout())?);
    let state = Arc::new(RocksStateStore::open_in_dir(&config.service.data_dir)?);
    Ok(PipelineContext::new(store, ledger, state, &config.service))
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load(&cli)?;

    let filters = cli.log_filters.as_deref().unwrap_or(&config.service.log_filters);
    let log_dir = if config.service.log_dir.trim().is_empty() { None } else { Some(config.service.log_dir.as_str()) };
    init_logger(log_dir, filters);

    info!(
        "questdrop starting network={} gateway={} data_dir={}",
        config.ledger.network, config.ledger.gateway_url, config.service.data_dir
    );
    let pipeline = build_pipeline(&config)?;

    if cli.reconcile {
        let reports = reconcile(&pipeline, None).await?;
        let failed = reports.iter().filter(|report| report.outcome.is_failed()).count();
        println!("{}", serde_json::to_string_pretty(&reports)?);
        info!("reconcile pass finished entries={} failed={}", reports.len(), failed);
        return Ok(());
    }

    if !config.rpc.enabled {
        return Err(QuestDropError::ConfigError("rpc.enabled is false and no other mode was requested".to_string()));
    }
    let addr: SocketAddr = config
        .rpc
        .addr
        .parse()
        .map_err(|err| QuestDropError::ConfigError(format!("invalid rpc.addr {:?}: {err}", config.rpc.addr)))?;

    let metrics = Arc::new(Metrics::new()?);
    let api_token = if config.rpc.token.trim().is_empty() { None } else { Some(config.rpc.token.clone()) };
    let state = Arc::new(AppState { pipeline, metrics, api_token });
    run_http_server(addr, state).await
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!("questdrop failed: {err}");
        eprintln!("questdrop failed: {err}");
        std::process::exit(1);
    }
}
