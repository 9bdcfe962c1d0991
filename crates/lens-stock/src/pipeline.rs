//! Lookup-and-render pipeline
//!
//! One [`Dashboard::run`] call validates the request, resolves the ticker,
//! fetches prices, derives metrics and composes the chart and table. The call
//! either yields a complete [`DashboardReport`] or an error; nothing partial.

use crate::api::{self, KrxListingClient, PriceFetcher};
use crate::cache::{CacheKey, PriceCache};
use crate::chart::{self, ChartSpec, PriceAxisPolicy};
use crate::config::StockConfig;
use crate::directory::{DirectoryCache, Ticker};
use crate::error::{Result, StockError};
use crate::export::TabularExport;
use crate::format::SummaryPanel;
use crate::metrics::{self, SummarySnapshot};
use crate::resolver::TickerResolver;
use crate::series::{DateRange, PriceSeries};
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// User input for one lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRequest {
    /// Company display name or 6-digit ticker
    pub query: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl LookupRequest {
    pub fn new(query: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            query: query.into(),
            start: Some(start),
            end: Some(end),
        }
    }

    /// Check presence and bounds of every field
    ///
    /// Surrounding whitespace is not part of the query.
    pub fn validate(&self, today: NaiveDate) -> Result<(String, DateRange)> {
        let query = self.query.trim();
        if query.is_empty() {
            return Err(StockError::MissingInput(
                "enter a company name or ticker to look up".to_string(),
            ));
        }
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return Err(StockError::MissingInput(
                "select both a start and an end date".to_string(),
            ));
        };
        let range = DateRange::bounded(start, end, today)?;
        Ok((query.to_string(), range))
    }
}

/// Parse an optional `YYYY-MM-DD` form field; blank means absent
pub fn parse_date_field(value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| StockError::InvalidInput(format!("'{raw}' is not a YYYY-MM-DD date: {e}"))),
    }
}

/// Everything the presentation layer renders for one lookup
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub company: String,
    pub ticker: Ticker,
    pub range: DateRange,
    pub fetched_at: DateTime<Local>,
    pub summary: SummarySnapshot,
    pub panel: SummaryPanel,
    pub chart: ChartSpec,
    pub table: TabularExport,
}

/// Resolve -> fetch -> compute -> compose
pub struct Dashboard {
    directory: Arc<DirectoryCache>,
    resolver: TickerResolver,
    fetcher: Arc<dyn PriceFetcher>,
    prices: Option<PriceCache>,
    price_axis: PriceAxisPolicy,
}

impl Dashboard {
    /// Wire the production KRX listing and configured price provider
    pub fn new(config: &StockConfig) -> Result<Self> {
        config.validate()?;
        let loader = Arc::new(KrxListingClient::new(config)?);
        let directory = Arc::new(DirectoryCache::new(loader, config.directory_refresh));
        let fetcher = api::price_fetcher(config)?;
        Ok(Self::with_components(directory, fetcher, config))
    }

    /// Wire explicit components
    pub fn with_components(
        directory: Arc<DirectoryCache>,
        fetcher: Arc<dyn PriceFetcher>,
        config: &StockConfig,
    ) -> Self {
        let prices = (!config.price_cache_ttl.is_zero())
            .then(|| PriceCache::new(config.price_cache_ttl));
        Self {
            resolver: TickerResolver::new(Arc::clone(&directory)),
            directory,
            fetcher,
            prices,
            price_axis: config.price_axis,
        }
    }

    pub fn directory(&self) -> &Arc<DirectoryCache> {
        &self.directory
    }

    pub fn price_axis(&self) -> PriceAxisPolicy {
        self.price_axis
    }

    /// Forget cached price series so the next lookups refetch
    pub async fn clear_price_cache(&self) -> usize {
        match &self.prices {
            Some(cache) => {
                let evicted = cache.clear().await;
                tracing::info!("Cleared {} cached price series", evicted);
                evicted
            }
            None => 0,
        }
    }

    /// Run one lookup against today's date
    pub async fn run(&self, request: &LookupRequest) -> Result<DashboardReport> {
        self.run_at(request, Local::now().date_naive()).await
    }

    /// Run one lookup, treating `today` as the latest selectable date
    pub async fn run_at(&self, request: &LookupRequest, today: NaiveDate) -> Result<DashboardReport> {
        let (company, range) = request.validate(today)?;

        let ticker = self.resolver.resolve(&company).await?;
        tracing::info!(
            "Resolved '{}' to {}, fetching {}..{}",
            company,
            ticker,
            range.start(),
            range.end()
        );

        let series = self.fetch(&ticker, &range).await?;
        if series.is_empty() {
            return Err(StockError::EmptyResult {
                ticker: ticker.to_string(),
                start: range.start(),
                end: range.end(),
            });
        }

        let analysis = metrics::compute(&series)?;
        let summary = analysis.summary.into_snapshot()?;
        let chart = chart::compose(&analysis.series, self.price_axis);
        let table = TabularExport::from_series(&analysis.series);
        let panel = SummaryPanel::new(&company, ticker.as_str(), &summary);

        tracing::info!("Rendered {} rows for {}", table.len(), ticker);

        Ok(DashboardReport {
            company,
            ticker,
            range,
            fetched_at: Local::now(),
            summary,
            panel,
            chart,
            table,
        })
    }

    async fn fetch(&self, ticker: &Ticker, range: &DateRange) -> Result<Arc<PriceSeries>> {
        match &self.prices {
            Some(cache) => {
                cache
                    .get_or_fetch(CacheKey::new(ticker, range), || {
                        self.fetcher.fetch(ticker, range)
                    })
                    .await
            }
            None => Ok(Arc::new(self.fetcher.fetch(ticker, range).await?)),
        }
    }
}
