//! Freightbook API Server
//!
//! Main entry point for the receivables and payables follow-up service.

mod scheduler;

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use freightbook_api::{AppState, create_router};
use freightbook_core::dunning::DunningPolicy;
use freightbook_core::tracking::BulkPolicy;
use freightbook_db::connect_with;
use freightbook_shared::AppConfig;
use freightbook_shared::clock::system_clock;

use crate::scheduler::Scheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "freightbook=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let state = AppState {
        db: Arc::new(db),
        clock: system_clock(),
        dunning_defaults: DunningPolicy::from_defaults(&config.dunning),
        bulk_policy: BulkPolicy::from_config(&config.ledger),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Scheduler::new(
        state.trackings(),
        state.dunning(),
        state.bulk_policy,
        &config.scheduler,
    )
    .map(|s| tokio::spawn(s.run(shutdown_rx)));

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .await?;

    shutdown_tx.send(true).ok();
    if let Some(handle) = scheduler {
        handle.await.context("Scheduler task panicked")?;
    }

    Ok(())
}
