//! # batepapo-server
//!
//! HTTP backend for a single public chat room.
//!
//! This binary provides:
//! - **Participant registry**: display-name registration and heartbeats
//! - **Message log**: public and private messages plus join/leave notices
//! - **Presence sweeper**: periodic eviction of participants that stopped
//!   sending heartbeats
//! - **REST API** (axum) over all of the above, backed by a SQLite store

mod api;
mod config;
mod error;
mod message_log;
mod registry;
mod store;
mod sweeper;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use batepapo_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::store::ChatStore;
use crate::sweeper::PresenceSweeper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,batepapo_server=debug")),
        )
        .init();

    info!("Starting batepapo server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration (.env first, then the process environment)
    // -----------------------------------------------------------------------
    if let Ok(path) = dotenvy::dotenv() {
        info!(path = %path.display(), "Loaded .env file");
    }

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the store (shared by every handler and the sweeper)
    // -----------------------------------------------------------------------
    let db = Database::open(&config.store_url, &config.store_name)?;
    let store = ChatStore::new(db, config.store_timeout);

    // -----------------------------------------------------------------------
    // 4. Spawn the presence sweeper
    // -----------------------------------------------------------------------
    let sweeper = PresenceSweeper::new(store.clone(), config.sweep_interval, config.stale_after)
        .spawn();
    info!(
        interval = ?config.sweep_interval,
        stale_after = ?config.stale_after,
        "Presence sweeper running"
    );

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server until Ctrl+C
    // -----------------------------------------------------------------------
    let app_state = AppState {
        store: store.clone(),
    };
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    let served = api::serve(app_state, config.http_addr, shutdown).await;
    if let Err(ref e) = served {
        error!(error = %e, "HTTP server failed");
    }

    // -----------------------------------------------------------------------
    // 6. Teardown
    // -----------------------------------------------------------------------
    sweeper.abort();
    let _ = sweeper.await;
    store.close();

    served
}
