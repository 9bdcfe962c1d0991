//! Configuration for dashboard lookups

use crate::chart::PriceAxisPolicy;
use crate::directory::RefreshPolicy;
use crate::error::{Result, StockError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// KRX KIND listed-company download page
pub const DEFAULT_LISTING_URL: &str =
    "http://kind.krx.co.kr/corpgeneral/corpList.do?method=download&searchType=13";

/// Naver Finance chart API host
pub const DEFAULT_NAVER_BASE_URL: &str = "https://api.finance.naver.com";

/// Price history provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriceProvider {
    /// Naver Finance daily chart data (default, no API key required)
    #[default]
    Naver,
    /// Yahoo Finance, `.KS` / `.KQ` symbols
    Yahoo,
}

impl FromStr for PriceProvider {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "naver" => Ok(Self::Naver),
            "yahoo" => Ok(Self::Yahoo),
            other => Err(StockError::ConfigError(format!(
                "unknown price provider '{other}'"
            ))),
        }
    }
}

/// Configuration for dashboard lookups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockConfig {
    /// Provider used for price history
    pub price_provider: PriceProvider,

    /// Listed-company download page
    pub listing_url: String,

    /// Naver Finance API base URL
    pub naver_base_url: String,

    /// When the company directory snapshot is refetched
    pub directory_refresh: RefreshPolicy,

    /// Cache TTL for fetched price series; zero disables the cache
    pub price_cache_ttl: Duration,

    /// Request timeout duration
    pub request_timeout: Duration,

    /// Outbound requests per second, per upstream
    pub requests_per_second: u32,

    /// Chart price axis behavior
    pub price_axis: PriceAxisPolicy,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            price_provider: PriceProvider::Naver,
            listing_url: DEFAULT_LISTING_URL.to_string(),
            naver_base_url: DEFAULT_NAVER_BASE_URL.to_string(),
            directory_refresh: RefreshPolicy::Manual,
            price_cache_ttl: Duration::from_secs(60),
            request_timeout: Duration::from_secs(30),
            requests_per_second: 5,
            price_axis: PriceAxisPolicy::Fixed,
        }
    }
}

impl StockConfig {
    /// Create a new configuration builder
    pub fn builder() -> StockConfigBuilder {
        StockConfigBuilder::default()
    }

    /// Overlay settings from `LENS_*` environment variables
    pub fn with_env(self) -> Result<Self> {
        Self::builder().with_base(self).with_env()?.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("listing_url", &self.listing_url),
            ("naver_base_url", &self.naver_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(StockError::ConfigError(format!(
                    "{name} must be an http(s) URL, got '{url}'"
                )));
            }
        }

        if self.requests_per_second == 0 {
            return Err(StockError::ConfigError(
                "requests_per_second must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(StockError::ConfigError(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for StockConfig
#[derive(Debug, Default)]
pub struct StockConfigBuilder {
    price_provider: Option<PriceProvider>,
    listing_url: Option<String>,
    naver_base_url: Option<String>,
    directory_refresh: Option<RefreshPolicy>,
    price_cache_ttl: Option<Duration>,
    request_timeout: Option<Duration>,
    requests_per_second: Option<u32>,
    price_axis: Option<PriceAxisPolicy>,
}

impl StockConfigBuilder {
    /// Start from an existing configuration
    pub fn with_base(self, config: StockConfig) -> Self {
        Self {
            price_provider: Some(config.price_provider),
            listing_url: Some(config.listing_url),
            naver_base_url: Some(config.naver_base_url),
            directory_refresh: Some(config.directory_refresh),
            price_cache_ttl: Some(config.price_cache_ttl),
            request_timeout: Some(config.request_timeout),
            requests_per_second: Some(config.requests_per_second),
            price_axis: Some(config.price_axis),
        }
    }

    /// Set the price provider
    pub fn price_provider(mut self, provider: PriceProvider) -> Self {
        self.price_provider = Some(provider);
        self
    }

    /// Set the listing page URL
    pub fn listing_url(mut self, url: impl Into<String>) -> Self {
        self.listing_url = Some(url.into());
        self
    }

    /// Set the Naver API base URL
    pub fn naver_base_url(mut self, url: impl Into<String>) -> Self {
        self.naver_base_url = Some(url.into());
        self
    }

    /// Set the directory refresh policy
    pub fn directory_refresh(mut self, policy: RefreshPolicy) -> Self {
        self.directory_refresh = Some(policy);
        self
    }

    /// Set the price cache TTL
    pub fn price_cache_ttl(mut self, duration: Duration) -> Self {
        self.price_cache_ttl = Some(duration);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the per-upstream request quota
    pub fn requests_per_second(mut self, rps: u32) -> Self {
        self.requests_per_second = Some(rps);
        self
    }

    /// Set the chart price axis policy
    pub fn price_axis(mut self, policy: PriceAxisPolicy) -> Self {
        self.price_axis = Some(policy);
        self
    }

    /// Load overrides from the environment
    ///
    /// `LENS_PRICE_PROVIDER`, `LENS_DIRECTORY_TTL_SECS` (0 = manual refresh),
    /// `LENS_PRICE_CACHE_TTL_SECS`, `LENS_REQUEST_TIMEOUT_SECS`, `LENS_PRICE_AXIS`.
    pub fn with_env(mut self) -> Result<Self> {
        if let Ok(provider) = std::env::var("LENS_PRICE_PROVIDER") {
            self.price_provider = Some(provider.parse()?);
        }
        if let Some(secs) = env_secs("LENS_DIRECTORY_TTL_SECS")? {
            self.directory_refresh = Some(if secs == 0 {
                RefreshPolicy::Manual
            } else {
                RefreshPolicy::Ttl(Duration::from_secs(secs))
            });
        }
        if let Some(secs) = env_secs("LENS_PRICE_CACHE_TTL_SECS")? {
            self.price_cache_ttl = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = env_secs("LENS_REQUEST_TIMEOUT_SECS")? {
            self.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Ok(axis) = std::env::var("LENS_PRICE_AXIS") {
            self.price_axis = Some(axis.parse().map_err(StockError::ConfigError)?);
        }
        Ok(self)
    }

    /// Build the configuration
    pub fn build(self) -> Result<StockConfig> {
        let defaults = StockConfig::default();

        let config = StockConfig {
            price_provider: self.price_provider.unwrap_or(defaults.price_provider),
            listing_url: self.listing_url.unwrap_or(defaults.listing_url),
            naver_base_url: self.naver_base_url.unwrap_or(defaults.naver_base_url),
            directory_refresh: self.directory_refresh.unwrap_or(defaults.directory_refresh),
            price_cache_ttl: self.price_cache_ttl.unwrap_or(defaults.price_cache_ttl),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            requests_per_second: self
                .requests_per_second
                .unwrap_or(defaults.requests_per_second),
            price_axis: self.price_axis.unwrap_or(defaults.price_axis),
        };

        config.validate()?;
        Ok(config)
    }
}

fn env_secs(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| StockError::ConfigError(format!("{name}='{value}': {e}"))),
        Err(_) => Ok(None),
    }
}
