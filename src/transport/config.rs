use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Environment variable holding the broker base URL.
pub const BROKER_URL_ENV: &str = "PINOT_BROKER_URL";
/// Environment variable holding the broker token.
pub const TOKEN_ENV: &str = "PINOT_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0} is required")]
    Missing(&'static str),

    #[error("Configuration error: invalid broker url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Configuration error: failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Options for the HTTP broker transport.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Broker base URL, e.g. `http://127.0.0.1:8099`.
    pub broker_url: String,
    /// Opaque token sent as `Authorization: Basic <token>`.
    pub token: String,
    /// Upper bound on a whole request, body included.
    pub body_timeout: Duration,
    /// Idle connections kept per host.
    pub connections: usize,
    /// How long an idle connection is kept alive.
    pub keep_alive_max_timeout: Duration,
}

impl HttpTransportConfig {
    #[must_use]
    pub fn new(broker_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            broker_url: broker_url.into(),
            token: token.into(),
            body_timeout: Duration::from_secs(60),
            connections: 1024,
            keep_alive_max_timeout: Duration::from_secs(60),
        }
    }

    /// Read `PINOT_BROKER_URL` and `PINOT_TOKEN` (token defaults to empty).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when the broker URL is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` when `PINOT_BROKER_URL` has no value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let broker_url = lookup(BROKER_URL_ENV).ok_or(ConfigError::Missing(BROKER_URL_ENV))?;
        let token = lookup(TOKEN_ENV).unwrap_or_default();
        Ok(Self::new(broker_url, token))
    }

    /// Check the broker URL and return it parsed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL is empty or does not parse.
    pub fn validate(&self) -> Result<Url, ConfigError> {
        if self.broker_url.trim().is_empty() {
            return Err(ConfigError::Missing("broker_url"));
        }
        Url::parse(&self.broker_url).map_err(|source| ConfigError::InvalidUrl {
            url: self.broker_url.clone(),
            source,
        })
    }
}

/// Fluent builder for [`HttpTransportConfig`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfigBuilder {
    config: HttpTransportConfig,
}

impl HttpTransportConfigBuilder {
    #[must_use]
    pub fn new(broker_url: impl Into<String>) -> Self {
        Self {
            config: HttpTransportConfig::new(broker_url, ""),
        }
    }

    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = token.into();
        self
    }

    #[must_use]
    pub fn body_timeout(mut self, timeout: Duration) -> Self {
        self.config.body_timeout = timeout;
        self
    }

    #[must_use]
    pub fn connections(mut self, connections: usize) -> Self {
        self.config.connections = connections;
        self
    }

    #[must_use]
    pub fn keep_alive_max_timeout(mut self, timeout: Duration) -> Self {
        self.config.keep_alive_max_timeout = timeout;
        self
    }

    #[must_use]
    pub fn finish(self) -> HttpTransportConfig {
        self.config
    }

    /// Build the transport.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL is invalid or the HTTP client cannot be built.
    pub fn build(self) -> Result<super::HttpTransport, ConfigError> {
        super::HttpTransport::new(self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = HttpTransportConfig::new("http://localhost:8099", "t");
        assert_eq!(cfg.body_timeout, Duration::from_secs(60));
        assert_eq!(cfg.connections, 1024);
        assert_eq!(cfg.keep_alive_max_timeout, Duration::from_secs(60));
    }

    #[test]
    fn builder_overrides() {
        let cfg = HttpTransportConfigBuilder::new("http://localhost:8099")
            .token("abc")
            .connections(32)
            .body_timeout(Duration::from_secs(5))
            .finish();
        assert_eq!(cfg.token, "abc");
        assert_eq!(cfg.connections, 32);
        assert_eq!(cfg.body_timeout, Duration::from_secs(5));
    }

    #[test]
    fn reads_url_and_token_from_variables() {
        let vars = |key: &str| match key {
            BROKER_URL_ENV => Some("http://broker:8099".to_string()),
            TOKEN_ENV => Some("tok".to_string()),
            _ => None,
        };
        let cfg = HttpTransportConfig::from_lookup(vars).unwrap();
        assert_eq!(cfg.broker_url, "http://broker:8099");
        assert_eq!(cfg.token, "tok");

        let cfg = HttpTransportConfig::from_lookup(|key| {
            (key == BROKER_URL_ENV).then(|| "http://broker:8099".to_string())
        })
        .unwrap();
        assert_eq!(cfg.token, "");

        assert!(matches!(
            HttpTransportConfig::from_lookup(|_| None),
            Err(ConfigError::Missing(BROKER_URL_ENV))
        ));
    }

    #[test]
    fn validation() {
        assert!(matches!(
            HttpTransportConfig::new("  ", "").validate(),
            Err(ConfigError::Missing(_))
        ));
        assert!(matches!(
            HttpTransportConfig::new("not a url", "").validate(),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(HttpTransportConfig::new("http://localhost:8099", "").validate().is_ok());
    }
}
