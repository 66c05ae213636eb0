//! esagate binary entry point

use std::path::PathBuf;

use clap::Parser;
use esagate::{AppState, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Session-gated viewer for an esa.io team
#[derive(Debug, Parser)]
#[command(name = "esagate", version, about)]
struct Args {
    /// Config file (default: esagate.toml next to the executable)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Application entry point
///
/// # Setup
/// 1. Parse command line
/// 2. Load and validate configuration
/// 3. Initialize tracing/logging
/// 4. Initialize AppState
/// 5. Build Axum router and start HTTP server
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Parse command line (`--version` exits here)
    let args = Args::parse();

    // 2. Load configuration
    let config = config::AppConfig::load(args.config.as_deref())?;

    // 3. Initialize tracing/logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "esagate=info,tower_http=info".into());

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!(
        team = %config.team,
        per_page = config.per_page,
        cookie_secure = config.cookie_secure,
        "Configuration loaded"
    );

    // 4. Initialize application state
    let state = AppState::new(config.clone())?;

    // 5. Build Axum router and serve
    let app = esagate::build_router(state);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
