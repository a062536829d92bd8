//! Main entry point for the Match Pool matchmaking service
//!
//! Initializes configuration, logging, the optional database-backed store,
//! and the HTTP API, then runs until a shutdown signal arrives and drains
//! the write-behind queue before exiting.

use anyhow::Result;
use clap::Parser;
use match_pool::config::AppConfig;
use match_pool::engine::MatchEngine;
use match_pool::metrics::MetricsCollector;
use match_pool::pool::GamerPool;
use match_pool::service::http::{ApiServer, ApiServerConfig};
use match_pool::service::MatchmakingService;
use match_pool::storage::{GamerStore, PostgresGamerStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Match Pool Matchmaking Service - skill- and latency-balanced group batching
#[derive(Parser)]
#[command(
    name = "match-pool",
    version,
    about = "A real-time matchmaking service batching gamers into balanced groups",
    long_about = "Match Pool keeps a shared pool of waiting gamers and batches them into \
                 fixed-size groups chosen to keep skill and latency spread low. Gamers \
                 join and leave over HTTP; groups and their statistics are recomputed \
                 on demand; additions and removals can be mirrored into Postgres via an \
                 asynchronous write-behind queue."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// HTTP port override
    #[arg(long, value_name = "PORT", help = "Override HTTP server port")]
    http_port: Option<u16>,

    /// Group size override
    #[arg(long, value_name = "SIZE", help = "Override the formed group size")]
    group_size: Option<usize>,

    /// Disable database persistence
    #[arg(long, help = "Keep gamers in memory only, even if a store is configured")]
    no_store: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Drain the store error channel, logging and counting failures
async fn store_error_task(
    mut errors: mpsc::Receiver<anyhow::Error>,
    metrics: Arc<MetricsCollector>,
) {
    while let Some(e) = errors.recv().await {
        warn!("Persistence failure (in-memory state unaffected): {}", e);
        metrics.record_store_failure();
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("Match Pool Matchmaking Service");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!(
        "   HTTP: {}:{}",
        config.service.http_host, config.service.http_port
    );
    info!("   Group size: {}", config.matchmaking.group_size);
    info!("   Persistence: {}", config.storage.enabled);
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if let Some(http_port) = args.http_port {
        config.service.http_port = http_port;
    }

    if let Some(group_size) = args.group_size {
        config.matchmaking.group_size = group_size;
    }

    if args.no_store {
        config.storage.enabled = false;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    // Core components
    let pool = Arc::new(GamerPool::new());
    let engine = Arc::new(MatchEngine::new(config.matchmaking.group_size));
    let metrics = Arc::new(MetricsCollector::new()?);

    // Connect the store if configured; fall back to memory-only on failure,
    // matching the pool-is-authoritative contract.
    let store: Option<Arc<dyn GamerStore>> = if config.storage.enabled {
        match PostgresGamerStore::connect(&config.storage.connection_url()).await {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                warn!(
                    "Failed to connect to the gamer store, continuing memory-only: {}",
                    e
                );
                None
            }
        }
    } else {
        None
    };

    let service = match store {
        Some(store) => {
            let (service, errors) = MatchmakingService::with_storage(
                pool,
                engine,
                metrics.clone(),
                store,
                config.storage.buffer_size,
            );
            tokio::spawn(store_error_task(errors, metrics.clone()));
            Arc::new(service)
        }
        None => Arc::new(MatchmakingService::new(pool, engine, metrics.clone())),
    };

    // HTTP API server
    let api_server = Arc::new(ApiServer::new(
        ApiServerConfig {
            host: config.service.http_host.clone(),
            port: config.service.http_port,
        },
        service.clone(),
        metrics,
    ));

    let server_task = {
        let api_server = api_server.clone();
        tokio::spawn(async move {
            if let Err(e) = api_server.start().await {
                error!("API server error: {}", e);
            }
        })
    };

    info!("Match Pool Matchmaking Service is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    wait_for_shutdown_signal().await;

    info!("Shutdown signal received, beginning graceful shutdown...");
    api_server.stop();

    // Drain the write-behind queue within the shutdown budget.
    match tokio::time::timeout(config.shutdown_timeout(), service.shutdown()).await {
        Ok(Ok(())) => info!("Graceful shutdown completed successfully"),
        Ok(Err(e)) => warn!("Shutdown error: {}", e),
        Err(_) => warn!("Shutdown timeout exceeded, forcing exit"),
    }

    server_task.abort();
    info!("Match Pool Matchmaking Service stopped");
    Ok(())
}
