//! Process configuration read from the environment

use crate::logging::LogFormat;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Errors raised while reading process configuration
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: &'static str, message: String },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (development, production, etc.)
    pub environment: String,
    /// Tracing output format
    pub log_format: LogFormat,
    /// Listen address of the dashboard server
    pub bind: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "krx-lens".to_string(),
            environment: "development".to_string(),
            log_format: LogFormat::Pretty,
            bind: SocketAddr::from(([127, 0, 0, 1], 8501)),
        }
    }
}

impl Config {
    /// Defaults overlaid with `LENS_ENV`, `LENS_LOG_FORMAT` and `LENS_BIND`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`] with an explicit variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(environment) = lookup("LENS_ENV") {
            config.environment = environment;
        }
        if let Some(format) = lookup("LENS_LOG_FORMAT") {
            config.log_format = format.parse().map_err(|message| ConfigError::InvalidValue {
                name: "LENS_LOG_FORMAT",
                message,
            })?;
        }
        if let Some(bind) = lookup("LENS_BIND") {
            config.bind = bind.trim().parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidValue {
                    name: "LENS_BIND",
                    message: e.to_string(),
                }
            })?;
        }

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
