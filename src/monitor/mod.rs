//! HTTP health server

pub mod health;

pub use health::{create_router, HealthReport};

use crate::error::Result;
use crate::storage::QuotaStore;
use std::sync::Arc;

/// Serve the health router on `0.0.0.0:<port>` until the process exits
pub async fn start_health_server(store: Arc<QuotaStore>, port: u16) -> Result<()> {
    let app = create_router(store);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Health server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
