//! Backage: status and dashboard web server.
//!
//! This is the application entry point. It initializes tracing, loads
//! configuration from the environment and an optional TOML file, runs startup
//! diagnostics, spawns the cron schedules and the service check, sets up the
//! Axum router and starts the HTTP server.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use backage::config::AppConfig;
use backage::diagnostics::{Diagnostics, Initializer};
use backage::http::start_server;
use backage::routes::create_router;
use backage::scheduler::spawn_schedules;
use backage::service_check::{check_service, client};
use backage::state::AppState;
use backage::system::{detect_os, ContainerNetwork, RuntimeInfo};

/// Backage: container status and dashboard server
#[derive(Parser, Debug)]
#[command(name = "backage", version, about)]
struct Args {
    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level filter (e.g., "backage=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

/// Service probed once at startup
const SERVICE_NAME: &str = "ipitio.github.io";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Configuration first: LOG_LEVEL feeds the default filter
    let config = Arc::new(AppConfig::load(args.config.as_deref())?);

    // Initialize tracing with priority: CLI > env > LOG_LEVEL
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| config.logging.filter());

    let registry = tracing_subscriber::registry().with(EnvFilter::new(&log_filter));
    if config.logging.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        release = %config.app.release,
        version = env!("CARGO_PKG_VERSION"),
        "Loaded configuration"
    );

    if config.api.key.is_none() {
        tracing::warn!(
            "API_KEY is not set; the restart api accepts requests without a key"
        );
    } else {
        tracing::info!("API_KEY configured for the restart api");
    }

    let network = ContainerNetwork::load(&config.container);
    let runtime = Arc::new(RuntimeInfo::new(detect_os()));

    let diagnostics = Arc::new(Diagnostics::new(
        config.clone(),
        network.clone(),
        runtime.clone(),
    ));
    diagnostics.initialize().await;

    spawn_schedules(config.clone());

    match client() {
        Ok(client) => {
            let target = config.app.project_url.clone();
            tokio::spawn(async move {
                check_service(&client, SERVICE_NAME, &target).await;
            });
        }
        Err(e) => {
            tracing::error!(error = %e, "Could not build the service check client");
        }
    }

    let state = AppState::new(config.clone(), network, runtime, diagnostics);
    let app = create_router(state);

    start_server(app, &config).await?;

    Ok(())
}
