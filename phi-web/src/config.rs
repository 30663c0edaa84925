//! Server settings, read from the environment at startup.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use phi_core::DeidConfig;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// `PHI_WEB_ADDR`, default `0.0.0.0:3000`
    pub addr: SocketAddr,
    /// Pipeline settings from the JSON file at `PHI_CONFIG`, or defaults
    pub deid: DeidConfig,
    /// `PHI_TIMEOUT_MS`: upper bound for one request's pipeline run
    pub request_timeout: Duration,
}

impl WebConfig {
    pub fn from_env() -> Result<Self> {
        let addr = env::var("PHI_WEB_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .context("PHI_WEB_ADDR must be a socket address like 0.0.0.0:3000")?;

        let deid = match env::var("PHI_CONFIG") {
            Ok(path) => DeidConfig::from_path(&path)
                .with_context(|| format!("failed to load pipeline config from {path}"))?,
            Err(_) => DeidConfig::default(),
        };

        let timeout_ms: u64 = env::var("PHI_TIMEOUT_MS")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .context("PHI_TIMEOUT_MS must be a number of milliseconds")?;

        Ok(Self {
            addr,
            deid,
            request_timeout: Duration::from_millis(timeout_ms),
        })
    }
}
