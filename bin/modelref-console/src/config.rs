//! Console configuration, loaded from environment variables at startup.

use std::time::Duration;

use modelref_client::{ClientError, ReferenceClient};

/// Runtime configuration for modelref-console.
///
/// Every field has a default so the console starts without any environment
/// variables set. CLI flags override the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"127.0.0.1:4200"`).
    pub bind_address: String,

    /// Root of the model reference REST service.
    pub base_url: String,

    /// API key for create, update and delete. A request's own `apikey`
    /// header takes precedence.
    pub api_key: Option<String>,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Per-request timeout towards the reference service.
    pub timeout_secs: u64,

    /// Serve Swagger UI for the console API.
    pub enable_swagger: bool,

    /// Comma-separated CORS origins; wildcard when unset.
    pub cors_allowed_origins: Option<String>,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("MODELREF_BIND", "127.0.0.1:4200"),
            base_url: env_or("MODELREF_BASE_URL", "http://127.0.0.1:19800/api"),
            api_key: std::env::var("MODELREF_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            log_level: env_or("MODELREF_LOG", "info"),
            log_json: parse_bool("MODELREF_LOG_JSON", false),
            timeout_secs: parse_env("MODELREF_TIMEOUT_SECS", 30),
            enable_swagger: parse_bool("MODELREF_ENABLE_SWAGGER", true),
            cors_allowed_origins: std::env::var("MODELREF_CORS_ORIGINS").ok(),
        }
    }

    /// Apply CLI overrides on top of the environment.
    pub fn with_overrides(mut self, base_url: Option<String>, api_key: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.api_key = Some(key);
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// HTTP client for the configured reference service.
    pub fn reference_client(&self) -> Result<ReferenceClient, ClientError> {
        let mut builder = ReferenceClient::builder(&self.base_url).timeout(self.timeout());
        if let Some(key) = &self.api_key {
            builder = builder.api_key(key);
        }
        builder.build()
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            bind_address: "127.0.0.1:0".into(),
            base_url: "http://localhost:19800/api".into(),
            api_key: None,
            log_level: "info".into(),
            log_json: false,
            timeout_secs: 0,
            enable_swagger: false,
            cors_allowed_origins: None,
        }
    }

    #[test]
    fn overrides_replace_env_values() {
        let cfg = config().with_overrides(Some("http://other/api".into()), Some("key".into()));
        assert_eq!(cfg.base_url, "http://other/api");
        assert_eq!(cfg.api_key.as_deref(), Some("key"));
    }

    #[test]
    fn empty_key_override_is_ignored() {
        let mut cfg = config();
        cfg.api_key = Some("env-key".into());
        let cfg = cfg.with_overrides(None, Some(String::new()));
        assert_eq!(cfg.api_key.as_deref(), Some("env-key"));
    }

    #[test]
    fn timeout_is_at_least_one_second() {
        assert_eq!(config().timeout(), Duration::from_secs(1));
    }

    #[test]
    fn builds_reference_client() {
        let client = config().reference_client().unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:19800/api");
    }
}
