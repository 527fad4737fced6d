//! Application configuration, loaded from the environment.

use std::time::Duration;

use anyhow::{bail, Context};

use crate::backend::BackendConfig;

/// Runtime settings for the gateway.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Hosted backend connection settings
    pub backend: BackendConfig,
    /// TTL for cached list reads
    pub cache_ttl: Duration,
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// `CLASSTABLE_BACKEND_KEY` is required; everything else has a
    /// development default.
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = match std::env::var("CLASSTABLE_BACKEND_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => bail!("CLASSTABLE_BACKEND_KEY must be set to the backend's publishable API key"),
        };

        let mut backend = BackendConfig {
            api_key,
            ..BackendConfig::default()
        };
        if let Ok(url) = std::env::var("CLASSTABLE_BACKEND_URL") {
            backend.base_url = url;
        }

        let bind_addr = std::env::var("CLASSTABLE_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let cache_ttl = match std::env::var("CLASSTABLE_CACHE_TTL_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse::<u64>()
                    .context("CLASSTABLE_CACHE_TTL_SECS must be a number of seconds")?,
            ),
            Err(_) => Duration::from_secs(5 * 60),
        };

        Ok(Self {
            bind_addr,
            backend,
            cache_ttl,
        })
    }
}
