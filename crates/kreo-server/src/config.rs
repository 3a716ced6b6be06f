//! Backend configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use kreo_ollama::{DEFAULT_MODEL, DEFAULT_OLLAMA_URL};

/// Default listen address, matching the port the web client expects.
pub const DEFAULT_BIND: &str = "127.0.0.1:3001";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bind address '{value}': {source}")]
    Bind {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Configuration for the Kreo backend.
#[derive(Debug, Clone)]
pub struct KreoConfig {
    /// Ollama server URL
    pub ollama_url: String,
    /// Address the HTTP server listens on
    pub bind: SocketAddr,
    /// Directory holding chats.json and knowledge.json
    pub data_dir: PathBuf,
    /// Upper bound for one web search
    pub search_timeout: Duration,
    /// Model used when a request names none, and warmed at start
    pub default_model: String,
    /// Load the default model into memory at start
    pub warm_on_start: bool,
}

impl Default for KreoConfig {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            bind: DEFAULT_BIND
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 3001))),
            data_dir: kreo_store::paths::default_data_dir(),
            search_timeout: Duration::from_secs(10),
            default_model: DEFAULT_MODEL.to_string(),
            warm_on_start: true,
        }
    }
}

impl KreoConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let ollama_url =
            std::env::var("KREO_OLLAMA_URL").unwrap_or_else(|_| defaults.ollama_url.clone());

        let bind = match std::env::var("KREO_BIND") {
            Ok(value) => parse_bind(&value)?,
            Err(_) => defaults.bind,
        };

        let data_dir = std::env::var("KREO_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let search_timeout = match std::env::var("KREO_SEARCH_TIMEOUT") {
            Ok(value) => value
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    key: "KREO_SEARCH_TIMEOUT",
                    value,
                })?,
            Err(_) => defaults.search_timeout,
        };

        let default_model = std::env::var("KREO_MODEL").unwrap_or(defaults.default_model);

        let warm_on_start = std::env::var("KREO_WARM")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(defaults.warm_on_start);

        Ok(Self {
            ollama_url,
            bind,
            data_dir,
            search_timeout,
            default_model,
            warm_on_start,
        })
    }

    /// Create a builder for configuration.
    pub fn builder() -> KreoConfigBuilder {
        KreoConfigBuilder::default()
    }
}

pub fn parse_bind(value: &str) -> Result<SocketAddr, ConfigError> {
    value.trim().parse().map_err(|source| ConfigError::Bind {
        value: value.to_string(),
        source,
    })
}

/// Builder for backend configuration.
#[derive(Debug, Default)]
pub struct KreoConfigBuilder {
    config: KreoConfig,
}

impl KreoConfigBuilder {
    /// Start from an existing configuration, e.g. one read from the environment.
    pub fn from_config(config: KreoConfig) -> Self {
        Self { config }
    }

    pub fn ollama_url(mut self, url: impl Into<String>) -> Self {
        self.config.ollama_url = url.into();
        self
    }

    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.config.bind = addr;
        self
    }

    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    pub fn search_timeout(mut self, timeout: Duration) -> Self {
        self.config.search_timeout = timeout;
        self
    }

    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.config.default_model = model.into();
        self
    }

    pub fn warm_on_start(mut self, warm: bool) -> Self {
        self.config.warm_on_start = warm;
        self
    }

    pub fn build(self) -> KreoConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KreoConfig::default();
        assert_eq!(config.ollama_url, "http://localhost:11434");
        assert_eq!(config.bind.port(), 3001);
        assert!(config.data_dir.ends_with(".kreo"));
        assert_eq!(config.default_model, "gemma3:4b");
    }

    #[test]
    fn test_builder_overrides() {
        let config = KreoConfig::builder()
            .ollama_url("http://gpu-box:11434")
            .bind("0.0.0.0:8080".parse().unwrap())
            .data_dir("/tmp/kreo")
            .warm_on_start(false)
            .build();
        assert_eq!(config.ollama_url, "http://gpu-box:11434");
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/kreo"));
        assert!(!config.warm_on_start);
    }

    #[test]
    fn test_parse_bind() {
        assert!(parse_bind(" 127.0.0.1:9000 ").is_ok());
        assert!(matches!(parse_bind("localhost"), Err(ConfigError::Bind { .. })));
    }
}
