mod config;
mod errors;
mod metrics;
mod models;
mod routes;
mod scheduler;
mod sheets;
mod source;
mod state;
mod sync;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::metrics::MetricsExtractor;
use crate::routes::build_router;
use crate::sheets::{GoogleSheets, SheetStore};
use crate::source::TwitterSource;
use crate::state::AppState;
use crate::sync::SyncOrchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sheet-sync v{}", env!("CARGO_PKG_VERSION"));

    let source = TwitterSource::new(&config)?;
    info!("Twitter client initialized (user id: {})", config.twitter.user_id);

    let sheets = GoogleSheets::new(&config)?;
    info!(
        "Sheets client initialized (spreadsheet: {}, tab: {})",
        config.sheets.spreadsheet_id, config.sheets.sheet_name
    );

    let orchestrator = Arc::new(SyncOrchestrator::new(
        Arc::new(source),
        SheetStore::new(Arc::new(sheets)),
        MetricsExtractor::from_config(&config),
    ));

    // Background daily sync; shares the orchestrator (and its run lock) with GET /sync
    let _scheduler = scheduler::spawn(orchestrator.clone(), config.schedule.clone());

    let state = AppState {
        config: Arc::new(config.clone()),
        orchestrator,
    };
    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
