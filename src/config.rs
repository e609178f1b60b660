// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! by the client. Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `NEXT_PUBLIC_API_URL` | Base URL of the QubitCore API | `https://api.qubitcore.com/v1` |
//! | `NODE_ENV` | Deployment environment; `production` enables `Secure` cookies | `development` |
//! | `QUBITCORE_COOKIE_FILE` | Cookie jar file used by the CLI | `.qubitcore/cookies.json` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Environment variable name for the API base URL.
pub const API_URL_ENV: &str = "NEXT_PUBLIC_API_URL";

/// Environment variable name for the deployment environment.
pub const ENVIRONMENT_ENV: &str = "NODE_ENV";

/// Environment variable name for the CLI cookie jar path.
pub const COOKIE_FILE_ENV: &str = "QUBITCORE_COOKIE_FILE";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_API_URL: &str = "https://api.qubitcore.com/v1";
pub const DEFAULT_COOKIE_FILE: &str = ".qubitcore/cookies.json";

/// Per-request timeout for API calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid API URL {url:?}: {reason}")]
    InvalidApiUrl { url: String, reason: String },
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "test" => Environment::Test,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    api_url: Url,
    pub environment: Environment,
    pub timeout: Duration,
    pub cookie_file: PathBuf,
}

impl ClientConfig {
    /// Create a configuration for `api_url` with defaults for everything else.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            environment: Environment::default(),
            timeout: REQUEST_TIMEOUT,
            cookie_file: PathBuf::from(DEFAULT_COOKIE_FILE),
        })
    }

    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = env_or_default(API_URL_ENV, DEFAULT_API_URL);
        let environment = env::var(ENVIRONMENT_ENV)
            .map(|v| Environment::from_str(&v))
            .unwrap_or_default();
        let cookie_file = PathBuf::from(env_or_default(COOKIE_FILE_ENV, DEFAULT_COOKIE_FILE));

        Ok(Self {
            environment,
            cookie_file,
            ..Self::new(&api_url)?
        })
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cookie_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookie_file = path.into();
        self
    }

    /// Base URL without a trailing slash.
    pub fn api_url(&self) -> &str {
        self.api_url.as_str().trim_end_matches('/')
    }

    /// Absolute URL for an API path such as `/auth/login`.
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url(), path.trim_start_matches('/'))
    }

    /// Whether session cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.environment.is_production()
    }
}

fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidApiUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidApiUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }
    Ok(url)
}

fn env_or_default(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_url_joins_paths() {
        let config = ClientConfig::new("https://api.qubitcore.com/v1/").unwrap();
        assert_eq!(config.api_url(), "https://api.qubitcore.com/v1");
        assert_eq!(
            config.endpoint_url("/auth/login"),
            "https://api.qubitcore.com/v1/auth/login"
        );
        assert_eq!(
            config.endpoint_url("auth/me"),
            "https://api.qubitcore.com/v1/auth/me"
        );
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(ClientConfig::new("not a url").is_err());
        assert!(ClientConfig::new("ftp://example.com").is_err());
    }

    #[test]
    fn environment_parsing() {
        assert_eq!(Environment::from_str("production"), Environment::Production);
        assert_eq!(Environment::from_str("PRODUCTION"), Environment::Production);
        assert_eq!(Environment::from_str("test"), Environment::Test);
        assert_eq!(Environment::from_str("anything"), Environment::Development);
    }

    #[test]
    fn secure_cookies_only_in_production() {
        let config = ClientConfig::new(DEFAULT_API_URL).unwrap();
        assert!(!config.secure_cookies());
        assert!(config
            .with_environment(Environment::Production)
            .secure_cookies());
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::new(DEFAULT_API_URL).unwrap();
        assert_eq!(config.timeout, REQUEST_TIMEOUT);
        assert_eq!(config.cookie_file, PathBuf::from(DEFAULT_COOKIE_FILE));
    }
}
