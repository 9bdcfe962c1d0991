//! Free-form company name or ticker -> ticker resolution

use crate::directory::{DirectoryCache, Ticker};
use crate::error::{Result, StockError};
use std::sync::Arc;

/// Resolves user input against the company directory
#[derive(Clone)]
pub struct TickerResolver {
    directory: Arc<DirectoryCache>,
}

impl TickerResolver {
    pub fn new(directory: Arc<DirectoryCache>) -> Self {
        Self { directory }
    }

    /// Resolve `input` to a ticker
    ///
    /// Six ASCII digits are returned as-is without consulting the directory.
    /// Anything else must match a company display name exactly.
    pub async fn resolve(&self, input: &str) -> Result<Ticker> {
        if let Some(ticker) = Ticker::parse(input) {
            tracing::debug!("'{}' is a literal ticker", input);
            return Ok(ticker);
        }

        let snapshot = self.directory.load().await;
        let directory = snapshot.require()?;

        let ticker = directory
            .lookup(input)
            .cloned()
            .ok_or_else(|| StockError::NotFound {
                input: input.to_string(),
            })?;

        if directory.tickers_for(input).len() > 1 {
            tracing::warn!(
                "'{}' is listed under {} tickers, using {}",
                input,
                directory.tickers_for(input).len(),
                ticker
            );
        }

        Ok(ticker)
    }
}
