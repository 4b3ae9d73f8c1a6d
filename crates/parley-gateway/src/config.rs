//! Gateway configuration loaded from environment variables.
//!
//! All settings except the API key have working defaults so the gateway can
//! start with zero configuration for local development.

use std::net::SocketAddr;

use parley_shared::constants::{DEFAULT_HTTP_PORT, DEFAULT_MODEL, MAX_UPLOAD_SIZE};

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address for the HTTP server.
    /// Env: `HTTP_ADDR`
    /// Default: `127.0.0.1:5000`
    pub http_addr: SocketAddr,

    /// API key sent as a bearer token to the upstream provider.
    /// Env: `OPENAI_API_KEY`
    /// Default: empty (every inference request will fail upstream).
    pub api_key: String,

    /// Base URL of the OpenAI-compatible upstream API.
    /// Env: `OPENAI_API_BASE`
    /// Default: `https://api.openai.com/v1`
    pub api_base: String,

    /// Model requested from the upstream provider.
    /// Env: `OPENAI_MODEL`
    /// Default: `gpt-4o-mini`
    pub model: String,

    /// Maximum accepted multipart body size in bytes.
    /// Env: `MAX_UPLOAD_SIZE`
    /// Default: 25 MiB
    pub max_upload_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            http_addr: ([127, 0, 0, 1], DEFAULT_HTTP_PORT).into(),
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_upload_size: MAX_UPLOAD_SIZE,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.api_key = key;
        }

        if let Ok(base) = std::env::var("OPENAI_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }

        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config.model = model;
        }

        if let Ok(val) = std::env::var("MAX_UPLOAD_SIZE") {
            match val.parse::<usize>() {
                Ok(n) => config.max_upload_size = n,
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid MAX_UPLOAD_SIZE, using default");
                }
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
