//! Configuration for the hosted backend client.

use std::time::Duration;

/// Connection settings for the hosted database-plus-auth service.
///
/// The schema (tables, columns, foreign keys) lives entirely on the
/// backend; this client only needs to know where the service is and
/// which publishable API key to present.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the hosted backend (auth under `/auth/v1`, tables
    /// under `/rest/v1`)
    pub base_url: String,
    /// Publishable (anon) API key sent with every request
    pub api_key: String,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            // Local development default for the hosted backend's CLI stack
            base_url: "http://127.0.0.1:54321".to_string(),
            api_key: String::new(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}
