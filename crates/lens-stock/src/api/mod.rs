//! Clients for the company listing and price history providers

pub mod krx;
pub mod naver;
pub mod yahoo;

pub use krx::KrxListingClient;
pub use naver::NaverPriceClient;
pub use yahoo::YahooPriceClient;

use crate::config::{PriceProvider, StockConfig};
use crate::directory::Ticker;
use crate::error::Result;
use crate::series::{DateRange, PriceSeries};
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

pub(crate) type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

pub(crate) fn rate_limiter(requests_per_second: u32) -> SharedRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

pub(crate) fn http_client(config: &StockConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(concat!("krx-lens/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Daily price history source
///
/// An empty series means the provider had no trading rows in the range;
/// provider or transport failures are errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceFetcher: Send + Sync {
    async fn fetch(&self, ticker: &Ticker, range: &DateRange) -> Result<PriceSeries>;
}

/// Build the configured price fetcher
pub fn price_fetcher(config: &StockConfig) -> Result<Arc<dyn PriceFetcher>> {
    Ok(match config.price_provider {
        PriceProvider::Naver => Arc::new(NaverPriceClient::new(config)?),
        PriceProvider::Yahoo => Arc::new(YahooPriceClient::new(config)),
    })
}
