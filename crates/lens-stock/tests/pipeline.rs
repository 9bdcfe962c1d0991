//! End-to-end lookups against in-memory providers

use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use lens_stock::directory::CompanyListing;
use lens_stock::{
    CompanyDirectory, Dashboard, DateRange, DirectoryCache, DirectoryLoader, ErrorKind,
    LookupRequest, PriceFetcher, PriceRow, PriceSeries, RefreshPolicy, Result, Severity,
    StockConfig, StockError, TabularExport, Ticker,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct StaticDirectory {
    listings: Vec<(&'static str, &'static str)>,
    calls: AtomicUsize,
}

impl StaticDirectory {
    fn new(listings: Vec<(&'static str, &'static str)>) -> Self {
        Self {
            listings,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DirectoryLoader for StaticDirectory {
    async fn load(&self) -> Result<CompanyDirectory> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CompanyDirectory::from_listings(self.listings.iter().map(
            |(name, code)| CompanyListing {
                name: (*name).to_string(),
                ticker: Ticker::parse(code).unwrap(),
            },
        )))
    }
}

struct FailingDirectory;

#[async_trait]
impl DirectoryLoader for FailingDirectory {
    async fn load(&self) -> Result<CompanyDirectory> {
        Err(StockError::ProviderError("KRX listing error: 503".into()))
    }
}

/// Serves fixed rows per ticker, filtered to the requested range
#[derive(Default)]
struct InMemoryPrices {
    rows: HashMap<String, Vec<PriceRow>>,
    calls: AtomicUsize,
}

impl InMemoryPrices {
    fn with(mut self, ticker: &str, rows: Vec<PriceRow>) -> Self {
        self.rows.insert(ticker.to_string(), rows);
        self
    }
}

#[async_trait]
impl PriceFetcher for InMemoryPrices {
    async fn fetch(&self, ticker: &Ticker, range: &DateRange) -> Result<PriceSeries> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rows = self
            .rows
            .get(ticker.as_str())
            .map(|rows| {
                rows.iter()
                    .copied()
                    .filter(|row| range.contains(row.date))
                    .collect()
            })
            .unwrap_or_default();
        Ok(PriceSeries::new(rows))
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2024, 6, 28)
}

/// `count` weekday rows starting at `first`, closing 100 won higher each day
fn trading_days(first: NaiveDate, count: usize) -> Vec<PriceRow> {
    let mut rows = Vec::with_capacity(count);
    let mut day = first;
    while rows.len() < count {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            let close = 55_000.0 + 100.0 * rows.len() as f64;
            rows.push(PriceRow {
                date: day,
                open: close - 50.0,
                high: close + 200.0,
                low: close - 300.0,
                close,
                volume: 10_000_000 + rows.len() as u64,
            });
        }
        day = day + Days::new(1);
    }
    rows
}

fn dashboard(loader: Arc<dyn DirectoryLoader>, prices: Arc<InMemoryPrices>) -> Dashboard {
    let config = StockConfig::default();
    let directory = Arc::new(DirectoryCache::new(loader, RefreshPolicy::Manual));
    Dashboard::with_components(directory, prices, &config)
}

fn samsung_directory() -> Arc<StaticDirectory> {
    Arc::new(StaticDirectory::new(vec![
        ("삼성전자", "005930"),
        ("카카오", "035720"),
    ]))
}

fn january_2023(query: &str) -> LookupRequest {
    LookupRequest::new(query, date(2023, 1, 1), date(2023, 1, 31))
}

#[tokio::test]
async fn ticker_lookup_renders_twenty_rows() {
    let prices =
        Arc::new(InMemoryPrices::default().with("005930", trading_days(date(2023, 1, 2), 20)));
    let directory = samsung_directory();
    let dashboard = dashboard(directory.clone(), prices.clone());

    let report = dashboard
        .run_at(&january_2023("005930"), today())
        .await
        .unwrap();

    assert_eq!(report.ticker.as_str(), "005930");
    assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
    assert_eq!(report.table.len(), 20);

    // first row of the table is the newest trading day
    let newest = &report.table.rows()[0];
    assert_eq!(newest.date, date(2023, 1, 27));
    assert_eq!(report.summary.date, newest.date);
    assert_eq!(report.summary.change, 100.0);

    // the twentieth row closes the first full 20-day window
    assert!(newest.ma20.is_some());
    assert!(report.table.rows()[1].ma20.is_none());
    assert!(report.table.rows().iter().all(|row| row.ma60.is_none()));
}

#[tokio::test]
async fn name_lookup_goes_through_directory() {
    let prices =
        Arc::new(InMemoryPrices::default().with("035720", trading_days(date(2023, 1, 2), 5)));
    let directory = samsung_directory();
    let dashboard = dashboard(directory.clone(), prices);

    let report = dashboard
        .run_at(&january_2023("카카오"), today())
        .await
        .unwrap();
    assert_eq!(report.ticker.as_str(), "035720");
    assert_eq!(report.company, "카카오");

    dashboard
        .run_at(&january_2023("삼성전자"), today())
        .await
        .unwrap_err();
    // the second lookup reuses the cached directory
    assert_eq!(directory.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_company_never_fetches() {
    let prices = Arc::new(InMemoryPrices::default());
    let dashboard = dashboard(samsung_directory(), prices.clone());

    let err = dashboard
        .run_at(&january_2023("없는회사"), today())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.kind().severity(), Severity::Warning);
    assert_eq!(prices.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn holiday_range_is_informational() {
    let prices =
        Arc::new(InMemoryPrices::default().with("005930", trading_days(date(2023, 1, 2), 20)));
    let dashboard = dashboard(samsung_directory(), prices);

    // Seollal 2022 holidays plus a weekend: no rows
    let request = LookupRequest::new("삼성전자", date(2022, 1, 29), date(2022, 2, 2));
    let err = dashboard.run_at(&request, today()).await.unwrap_err();

    assert!(matches!(err, StockError::EmptyResult { ref ticker, .. } if ticker == "005930"));
    assert_eq!(err.kind().severity(), Severity::Info);
}

#[tokio::test]
async fn single_row_cannot_be_summarized() {
    let prices =
        Arc::new(InMemoryPrices::default().with("005930", trading_days(date(2023, 1, 2), 1)));
    let dashboard = dashboard(samsung_directory(), prices);

    let err = dashboard
        .run_at(&january_2023("005930"), today())
        .await
        .unwrap_err();
    assert!(matches!(err, StockError::InsufficientData { rows: 1 }));
}

#[tokio::test]
async fn missing_fields_are_rejected_first() {
    let prices = Arc::new(InMemoryPrices::default());
    let directory = samsung_directory();
    let dashboard = dashboard(directory.clone(), prices.clone());

    let err = dashboard
        .run_at(&january_2023("  "), today())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingInput);
    assert_eq!(err.kind().severity(), Severity::Warning);

    let no_dates = LookupRequest {
        query: "삼성전자".into(),
        start: None,
        end: None,
    };
    let err = dashboard.run_at(&no_dates, today()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingInput);

    assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
    assert_eq!(prices.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn future_end_date_is_rejected() {
    let dashboard = dashboard(samsung_directory(), Arc::new(InMemoryPrices::default()));
    let request = LookupRequest::new("005930", date(2024, 1, 1), date(2024, 7, 1));
    let err = dashboard.run_at(&request, today()).await.unwrap_err();
    assert!(matches!(err, StockError::InvalidInput(_)));
}

#[tokio::test]
async fn failed_directory_still_serves_tickers() {
    let prices =
        Arc::new(InMemoryPrices::default().with("005930", trading_days(date(2023, 1, 2), 3)));
    let dashboard = dashboard(Arc::new(FailingDirectory), prices);

    let err = dashboard
        .run_at(&january_2023("삼성전자"), today())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DirectoryUnavailable);
    assert!(!dashboard.directory().is_cached().await);

    let report = dashboard
        .run_at(&january_2023("005930"), today())
        .await
        .unwrap();
    assert_eq!(report.table.len(), 3);
}

#[tokio::test]
async fn export_round_trips_newest_first() {
    let prices =
        Arc::new(InMemoryPrices::default().with("005930", trading_days(date(2023, 1, 2), 25)));
    let dashboard = dashboard(samsung_directory(), prices);

    let report = dashboard
        .run_at(
            &LookupRequest::new("삼성전자", date(2023, 1, 1), date(2023, 2, 28)),
            today(),
        )
        .await
        .unwrap();

    let bytes = report.table.to_xlsx().unwrap();
    let restored = TabularExport::read_xlsx(&bytes).unwrap();

    assert_eq!(restored.len(), 25);
    assert!(
        restored
            .rows()
            .windows(2)
            .all(|pair| pair[0].date > pair[1].date)
    );
    assert_eq!(restored.rows(), report.table.rows());
    assert_eq!(restored.rows()[24].ma20, None);
}

#[tokio::test]
async fn chart_volume_axis_tracks_max_volume() {
    let prices =
        Arc::new(InMemoryPrices::default().with("005930", trading_days(date(2023, 1, 2), 10)));
    let dashboard = dashboard(samsung_directory(), prices);

    let report = dashboard
        .run_at(&january_2023("005930"), today())
        .await
        .unwrap();

    let json = serde_json::to_value(&report.chart).unwrap();
    let range = json["layout"]["yaxis2"]["range"].as_array().unwrap();
    let max_volume = 10_000_009.0_f64;
    assert_eq!(range[0].as_f64(), Some(0.0));
    assert!((range[1].as_f64().unwrap() - max_volume * 1.1).abs() < 1e-3);
    assert_eq!(json["data"][0]["type"], "candlestick");
}
