// crates/server/src/main.rs
//! Fleet-status server binary.
//!
//! Binds the HTTP listener, then spawns the periodic sweep that drops
//! terminal job records once their retention window passes.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use fleet_status_server::{create_app, MemoryJobStore};

/// Default port for the server.
const DEFAULT_PORT: u16 = 47810;

/// How often the sweep task scans for expired terminal records.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Get the server port from environment or use default.
fn get_port() -> u16 {
    std::env::var("FLEET_STATUS_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();

    let store = Arc::new(MemoryJobStore::new());

    // Sweep expired terminal records in the background.
    let sweeper = store.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(SWEEP_INTERVAL).await;
            let removed = sweeper.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, "swept expired job records");
            }
        }
    });

    let app = create_app(store);

    let port = get_port();
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        %addr,
        "fleet-status listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
