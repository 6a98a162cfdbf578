//! HTTP read API over the snapshot store.
//!
//! Lets processes that cannot read the artifact file directly (the dashboard
//! front end, remote tooling) fetch the current smoothed readings.

pub mod config;
pub mod handlers;
pub mod router;

// Re-export commonly used items
pub use config::WebConfig;
pub use router::create_app;

use crate::error::{MonitorError, Result};
use crate::store::SnapshotStore;
use tracing::info;

/// Start the web server with the provided configuration.
pub async fn start_web_server(config: WebConfig, store: SnapshotStore) -> Result<()> {
    let addr = config.socket_addr()?;
    let app = create_app(&config, store.clone());

    info!("Starting snapshot API on http://{}", addr);
    info!("Serving {} at http://{}/api/snapshot", store.path().display(), addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| MonitorError::web_server_error(format!("Failed to bind to address: {}", e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| MonitorError::web_server_error(format!("Server error: {}", e)))?;

    Ok(())
}
