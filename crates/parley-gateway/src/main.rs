//! # parley-gateway
//!
//! Inference gateway for Parley clients.
//!
//! This binary provides:
//! - **`POST /api/openai`**: accepts a multipart submission (one `text`
//!   field, repeated `images` fields), downscales and base64-encodes the
//!   images, forwards everything as one user message to an OpenAI-compatible
//!   chat-completions API, and answers `{"result": ...}` or `{"error": ...}`
//! - **`GET /health`**: liveness probe
//! - **Per-IP throttling** so one client cannot drain the upstream budget

mod api;
mod config;
mod error;
mod imaging;
mod rate_limit;
mod upstream;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::GatewayConfig;
use crate::rate_limit::Throttle;
use crate::upstream::UpstreamClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,parley_gateway=debug")),
        )
        .init();

    info!("Starting Parley gateway v{}", env!("CARGO_PKG_VERSION"));

    let config = GatewayConfig::from_env();
    info!(
        addr = %config.http_addr,
        model = %config.model,
        api_base = %config.api_base,
        "Loaded configuration"
    );
    if config.api_key.is_empty() {
        warn!("OPENAI_API_KEY is not set; inference requests will fail upstream");
    }

    let throttle = Throttle::default();
    let state = AppState {
        upstream: Arc::new(UpstreamClient::new(&config)),
        throttle: throttle.clone(),
        config: Arc::new(config.clone()),
    };

    // Keep the throttle map bounded: every few minutes, forget IPs that have
    // been quiet for over ten.
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            throttle.purge_idle(600.0).await;
        }
    });

    tokio::select! {
        result = api::serve(state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
