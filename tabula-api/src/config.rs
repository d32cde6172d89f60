//! API Configuration Module
//!
//! HTTP-level settings: bind address, CORS and the per-request timeout.
//! Configuration is loaded from environment variables with defaults suited
//! to local development.

use std::net::SocketAddr;
use std::time::Duration;

use crate::constants::{DEFAULT_CORS_MAX_AGE_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::error::{ApiError, ApiResult};

/// API configuration for the HTTP surface.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to bind.
    pub bind_host: String,

    /// Port to listen on.
    pub port: u16,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    /// Example: "https://tabula.example.com,https://admin.tabula.example.com"
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    /// Requests running longer than this are answered with 504.
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
            cors_max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `TABULA_API_BIND`: Interface to bind (default: 0.0.0.0)
    /// - `PORT` or `TABULA_API_PORT`: Listen port (default: 3000)
    /// - `TABULA_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `TABULA_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `TABULA_REQUEST_TIMEOUT_SECS`: Per-request timeout (default: 30)
    pub fn from_env() -> ApiResult<Self> {
        let defaults = Self::default();

        let port = match std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("TABULA_API_PORT").ok())
        {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", value)))?,
            None => defaults.port,
        };

        let cors_origins = std::env::var("TABULA_CORS_ORIGINS")
            .ok()
            .map(|s| parse_origins(&s))
            .unwrap_or_default();

        let cors_max_age_secs = std::env::var("TABULA_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let request_timeout = std::env::var("TABULA_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        Ok(Self {
            bind_host: std::env::var("TABULA_API_BIND").unwrap_or(defaults.bind_host),
            port,
            cors_origins,
            cors_max_age_secs,
            request_timeout,
        })
    }

    /// Socket address the server listens on.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|allowed| allowed == origin)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.cors_max_age_secs, 86400);
        assert_eq!(config.port, 3000);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_bind_addr() -> ApiResult<()> {
        let config = ApiConfig {
            bind_host: "127.0.0.1".to_string(),
            port: 8080,
            ..ApiConfig::default()
        };
        assert_eq!(config.bind_addr()?.to_string(), "127.0.0.1:8080");

        let bad = ApiConfig {
            bind_host: "not an address".to_string(),
            ..ApiConfig::default()
        };
        assert!(bad.bind_addr().is_err());
        Ok(())
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("https://a.example, ,https://b.example "),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_origin_allowed() {
        let mut config = ApiConfig::default();
        assert!(config.is_origin_allowed("http://localhost:5173"));

        config.cors_origins = vec!["https://tabula.example.com".to_string()];
        assert!(config.is_origin_allowed("https://tabula.example.com"));
        assert!(!config.is_origin_allowed("https://evil.example.com"));
    }
}
