//! KRX stock lookup and charting
//!
//! This crate turns a company name or 6-digit ticker plus a date range into
//! everything a dashboard shows:
//!
//! - Company directory scraped from the KRX KIND listing page
//! - Daily OHLCV history from Naver Finance or Yahoo Finance
//! - 20/60/120-day moving averages and a latest-day summary
//! - A Plotly-compatible candlestick figure with a volume overlay
//! - An xlsx export of the analyzed rows, newest first
//!
//! # Example
//!
//! ```rust,no_run
//! use lens_stock::{Dashboard, LookupRequest, StockConfig};
//! use chrono::NaiveDate;
//!
//! #[tokio::main]
//! async fn main() -> lens_stock::Result<()> {
//!     let config = StockConfig::builder().with_env()?.build()?;
//!     let dashboard = Dashboard::new(&config)?;
//!
//!     let request = LookupRequest::new(
//!         "삼성전자",
//!         NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
//!         NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
//!     );
//!     let report = dashboard.run(&request).await?;
//!     println!("{}", report.panel.render());
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod chart;
pub mod config;
pub mod directory;
pub mod error;
pub mod export;
pub mod format;
pub mod metrics;
pub mod pipeline;
pub mod resolver;
pub mod series;

// Re-export main types for convenience
pub use api::PriceFetcher;
pub use chart::{ChartSpec, PriceAxisPolicy};
pub use config::{PriceProvider, StockConfig};
pub use directory::{CompanyDirectory, DirectoryCache, DirectoryLoader, RefreshPolicy, Ticker};
pub use error::{ErrorKind, Result, Severity, StockError};
pub use export::TabularExport;
pub use format::SummaryPanel;
pub use metrics::{Analysis, SummarySnapshot};
pub use pipeline::{Dashboard, DashboardReport, LookupRequest, parse_date_field};
pub use resolver::TickerResolver;
pub use series::{DateRange, PriceRow, PriceSeries};
