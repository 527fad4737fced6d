use std::sync::Arc;

use tracing::info;

use crate::backend::BackendClient;
use crate::config::AppConfig;
use crate::types::AppState;

mod auth;
mod backend;
mod cache;
mod config;
mod server;
mod types;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env()?;
    let backend = BackendClient::new(config.backend.clone())?;
    let state = Arc::new(AppState::new(config, backend));

    let router = server::create_router(state.clone());
    let listener = tokio::net::TcpListener::bind(&state.config.bind_addr).await?;
    info!(
        "Listening on {} (backend at {})",
        state.config.bind_addr, state.config.backend.base_url
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
