//! HTTP and WebSocket front end for the de-identification pipeline

mod config;
mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use phi_core::Deidentifier;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::WebConfig;
use crate::routes::{router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = WebConfig::from_env()?;
    let pipeline =
        Deidentifier::new(config.deid.clone()).context("failed to build the pipeline")?;
    let state = Arc::new(AppState::new(pipeline, config.request_timeout));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    info!(addr = %config.addr, "phi-web listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
