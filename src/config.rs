//! Centralized configuration management for posadmin

use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Result, Context};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend, without the `/api` suffix
    pub api_backend: String,
    /// File holding the bearer token between runs
    pub token_path: PathBuf,
    /// Records requested per list page
    pub per_page: u32,
    /// HTTP client configuration
    pub http: HttpConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: "posadmin/0.1.0".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_backend: "http://localhost:8000".to_string(),
            token_path: PathBuf::from("./.posadmin_token"),
            per_page: 10,
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let api_backend = std::env::var("POSADMIN_API_BACKEND")
            .unwrap_or(defaults.api_backend)
            .trim_end_matches('/')
            .to_string();

        let token_path = std::env::var("POSADMIN_TOKEN_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.token_path);

        let http = HttpConfig {
            timeout_seconds: parse_env_var("POSADMIN_HTTP_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.http.timeout_seconds),
            user_agent: std::env::var("POSADMIN_USER_AGENT")
                .unwrap_or(defaults.http.user_agent),
        };

        Ok(Config {
            api_backend,
            token_path,
            per_page: parse_env_var("POSADMIN_PER_PAGE")?.unwrap_or(defaults.per_page),
            http,
        })
    }

    /// Point the configuration at another backend (used by tests and `--backend`)
    pub fn with_backend(mut self, api_backend: &str) -> Self {
        self.api_backend = api_backend.trim_end_matches('/').to_string();
        self
    }

    /// Full URL for a path below `/api`
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.api_backend, path.trim_start_matches('/'))
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.api_backend.starts_with("http://") || self.api_backend.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "Backend URL must start with http:// or https://: {}",
                self.api_backend
            ));
        }

        if self.per_page == 0 {
            return Err(anyhow::anyhow!("POSADMIN_PER_PAGE must be greater than zero"));
        }

        if let Some(parent) = self.token_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(anyhow::anyhow!(
                    "Token directory does not exist: {}",
                    parent.display()
                ));
            }
        }

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.api_backend, "http://localhost:8000");
        assert_eq!(config.per_page, 10);
        assert_eq!(config.http.timeout_seconds, 30);
        config.validate().unwrap();
    }

    #[test]
    fn test_api_url() {
        let config = Config::default().with_backend("http://pos.local/");
        assert_eq!(config.api_url("categories"), "http://pos.local/api/categories");
        assert_eq!(config.api_url("/products/3"), "http://pos.local/api/products/3");
    }

    #[test]
    fn test_config_validation() {
        let bad_scheme = Config::default().with_backend("pos.local");
        assert!(bad_scheme.validate().is_err());

        let mut zero_page = Config::default();
        zero_page.per_page = 0;
        assert!(zero_page.validate().is_err());

        let mut missing_dir = Config::default();
        missing_dir.token_path = PathBuf::from("/definitely/not/here/token");
        assert!(missing_dir.validate().is_err());
    }
}
