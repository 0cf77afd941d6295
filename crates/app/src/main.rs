//! KSYK campus map server
//!
//! Serves the admin and visitor API over the campus database. The first
//! argument, when given, is the path of a `ksyk.toml` configuration file.

use std::path::PathBuf;

use ksyk_core::AppConfig;
use ksyk_net::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod state;

fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting KSYK campus map");

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(config)) {
        tracing::error!("Server failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> ksyk_net::Result<()> {
    let db = state::open_database(&config)?;
    state::prepare(&db, &config)?;

    let listener = ksyk_net::bind(&config.server.bind).await?;
    ksyk_net::serve(listener, AppState::new(db, config), shutdown_signal()).await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested"),
        Err(e) => {
            tracing::warn!("Ctrl-C handler unavailable, running until killed: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
