//! Yahoo Finance price client for KRX tickers

use super::PriceFetcher;
use crate::config::StockConfig;
use crate::directory::Ticker;
use crate::error::{Result, StockError};
use crate::series::{DateRange, PriceRow, PriceSeries};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime};
use std::time::Duration;
use time::OffsetDateTime;
use yahoo_finance_api as yahoo;

/// KST is UTC+9 with no daylight saving
const KST_OFFSET_SECS: i64 = 9 * 3600;

/// Exchange suffixes tried in order: KOSPI, then KOSDAQ
const SUFFIXES: [&str; 2] = ["KS", "KQ"];

/// Yahoo Finance price client
#[derive(Debug, Clone)]
pub struct YahooPriceClient {
    timeout: Duration,
}

impl YahooPriceClient {
    pub fn new(config: &StockConfig) -> Self {
        Self {
            timeout: config.request_timeout,
        }
    }

    /// Yahoo symbol for `ticker` on the exchange with `suffix`
    pub fn symbol(ticker: &Ticker, suffix: &str) -> String {
        format!("{ticker}.{suffix}")
    }

    async fn history(&self, symbol: &str, range: &DateRange) -> Result<Vec<PriceRow>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let start = kst_midnight(range.start())?;
        let end = kst_midnight(range.end() + chrono::Days::new(1))?;

        let response = tokio::time::timeout(
            self.timeout,
            provider.get_quote_history(symbol, start, end),
        )
        .await
        .map_err(|_| StockError::YahooFinanceError(format!("{symbol}: request timed out")))?
        .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| StockError::YahooFinanceError(e.to_string()))?;

        Ok(quotes
            .iter()
            .filter_map(|q| {
                let date = kst_date(q.timestamp as i64)?;
                Some(PriceRow {
                    date,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: q.volume,
                })
            })
            .filter(|row| range.contains(row.date) && row.has_valid_prices())
            .collect())
    }
}

#[async_trait]
impl PriceFetcher for YahooPriceClient {
    async fn fetch(&self, ticker: &Ticker, range: &DateRange) -> Result<PriceSeries> {
        let mut last_error = None;
        for suffix in SUFFIXES {
            let symbol = Self::symbol(ticker, suffix);
            match self.history(&symbol, range).await {
                Ok(rows) => return Ok(PriceSeries::new(rows)),
                Err(e) => {
                    tracing::debug!("Yahoo lookup for {} failed: {}", symbol, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| StockError::YahooFinanceError(ticker.to_string())))
    }
}

fn kst_midnight(date: NaiveDate) -> Result<OffsetDateTime> {
    let utc = date.and_time(NaiveTime::MIN).and_utc().timestamp() - KST_OFFSET_SECS;
    OffsetDateTime::from_unix_timestamp(utc)
        .map_err(|e| StockError::YahooFinanceError(format!("Invalid timestamp for {date}: {e}")))
}

fn kst_date(timestamp: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + KST_OFFSET_SECS, 0).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol() {
        let ticker = Ticker::parse("005930").unwrap();
        assert_eq!(YahooPriceClient::symbol(&ticker, "KS"), "005930.KS");
    }

    #[test]
    fn test_kst_conversion() {
        let date = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let midnight = kst_midnight(date).unwrap();
        // 2023-01-01T15:00:00Z
        assert_eq!(midnight.unix_timestamp(), 1_672_585_200);

        // market open 09:00 KST is 00:00 UTC the same day
        assert_eq!(kst_date(1_672_617_600), Some(date));
        // 23:00 UTC is already the next KST day
        assert_eq!(
            kst_date(1_672_614_000),
            NaiveDate::from_ymd_opt(2023, 1, 2)
        );
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_samsung() {
        let client = YahooPriceClient::new(&StockConfig::default());
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 1, 31).unwrap(),
        )
        .unwrap();
        let series = client
            .fetch(&Ticker::parse("005930").unwrap(), &range)
            .await
            .unwrap();
        assert!(!series.is_empty());
    }
}
