//! Server configuration from the environment

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_DB: &str = "katalog.sqlite";
const DEFAULT_LOOKUP_TIMEOUT_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: String,
    pub db_path: PathBuf,
    /// Bearer token required on every request; unauthenticated access is
    /// allowed when unset (development).
    pub api_token: Option<String>,
    pub gemini_api_key: Option<String>,
    /// Explicit bound on the whole streaming lookup call.
    pub lookup_timeout: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let timeout_secs = std::env::var("SCHULBIB_LOOKUP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LOOKUP_TIMEOUT_SECS);

        Self {
            addr: std::env::var("SCHULBIB_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string()),
            db_path: std::env::var("SCHULBIB_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB)),
            api_token: std::env::var("SCHULBIB_API_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            gemini_api_key: std::env::var("GOOGLE_GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            lookup_timeout: Duration::from_secs(timeout_secs),
        }
    }
}
