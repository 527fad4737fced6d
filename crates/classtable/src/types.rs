//! Shared application state.

use crate::auth::AuthContext;
use crate::backend::BackendClient;
use crate::cache::ListCache;
use crate::config::AppConfig;

/// Everything the HTTP layer needs, shared behind an `Arc`.
pub struct AppState {
    /// Runtime configuration
    pub config: AppConfig,
    /// Client for the hosted backend
    pub backend: BackendClient,
    /// Process-wide session context
    pub auth: AuthContext,
    /// Cached table list reads
    pub cache: ListCache,
}

impl AppState {
    pub fn new(config: AppConfig, backend: BackendClient) -> Self {
        let cache = ListCache::new(config.cache_ttl);
        Self {
            config,
            backend,
            auth: AuthContext::new(),
            cache,
        }
    }
}
