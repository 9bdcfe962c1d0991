//! Naver Finance daily price client
//!
//! `siseJson.naver` answers with a JavaScript array literal rather than strict
//! JSON: the header row uses single-quoted strings. Data rows look like
//! `["20230102", 55500, 56100, 55200, 55500, 10031448, 50.63]`.

use super::{PriceFetcher, SharedRateLimiter, http_client, rate_limiter};
use crate::config::StockConfig;
use crate::directory::Ticker;
use crate::error::{Result, StockError};
use crate::series::{DateRange, PriceRow, PriceSeries, compact, parse_compact};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

const SISE_PATH: &str = "/siseJson.naver";

/// Naver Finance price client
pub struct NaverPriceClient {
    client: Client,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl NaverPriceClient {
    pub fn new(config: &StockConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            base_url: config.naver_base_url.trim_end_matches('/').to_string(),
            rate_limiter: rate_limiter(config.requests_per_second),
        })
    }
}

#[async_trait]
impl PriceFetcher for NaverPriceClient {
    async fn fetch(&self, ticker: &Ticker, range: &DateRange) -> Result<PriceSeries> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, SISE_PATH);
        let start = compact(range.start());
        let end = compact(range.end());
        tracing::debug!("Fetching {} prices {}..{}", ticker, start, end);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("symbol", ticker.as_str()),
                ("requestType", "1"),
                ("startTime", start.as_str()),
                ("endTime", end.as_str()),
                ("timeframe", "day"),
            ])
            .send()
            .await
            .map_err(|e| StockError::ProviderError(format!("Naver request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(StockError::ProviderError(format!(
                "Naver API error: {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        let series = parse_sise_json(&body)?;

        // the endpoint already filters by range; keep the contract explicit
        let rows = series
            .rows()
            .iter()
            .copied()
            .filter(|row| range.contains(row.date))
            .collect();
        Ok(PriceSeries::new(rows))
    }
}

/// Parse a `siseJson.naver` body into a series
pub fn parse_sise_json(body: &str) -> Result<PriceSeries> {
    let normalized = body.trim().replace('\'', "\"");
    if normalized.is_empty() {
        return Ok(PriceSeries::empty());
    }
    let table: Vec<Vec<Value>> = serde_json::from_str(&normalized)?;

    let mut rows = Vec::with_capacity(table.len());
    for (line, cells) in table.iter().enumerate() {
        let Some(first) = cells.first().and_then(Value::as_str) else {
            return Err(StockError::ParseError(format!(
                "row {line} does not start with a date"
            )));
        };
        // header row: '날짜', '시가', ...
        if line == 0 && parse_compact(first).is_err() {
            continue;
        }

        let row = parse_row(first, cells, line)?;
        if row.has_valid_prices() {
            rows.push(row);
        } else {
            tracing::warn!("Dropping {} with non-positive prices", row.date);
        }
    }

    Ok(PriceSeries::new(rows))
}

fn parse_row(date: &str, cells: &[Value], line: usize) -> Result<PriceRow> {
    let number = |idx: usize, name: &str| {
        cells.get(idx).and_then(Value::as_f64).ok_or_else(|| {
            StockError::ParseError(format!("row {line}: missing or non-numeric {name}"))
        })
    };

    Ok(PriceRow {
        date: parse_compact(date)?,
        open: number(1, "open")?,
        high: number(2, "high")?,
        low: number(3, "low")?,
        close: number(4, "close")?,
        volume: number(5, "volume")?.max(0.0) as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const BODY: &str = "\n [['날짜', '시가', '고가', '저가', '종가', '거래량', '외국인소진율'],\n\
        [\"20230103\", 55400, 56000, 54500, 55400, 13547030, 49.68],\n\
        [\"20230102\", 55500, 56100, 55200, 55500, 10031448, 49.67],\n\
        [\"20230104\", 0, 0, 0, 55400, 0, 49.70]\n]\n";

    #[test]
    fn test_parse_sise_json() {
        let series = parse_sise_json(BODY).unwrap();
        assert_eq!(series.len(), 2);

        let first = series.first().unwrap();
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
        assert_eq!(first.open, 55_500.0);
        assert_eq!(first.close, 55_500.0);
        assert_eq!(first.volume, 10_031_448);

        assert_eq!(series.last().unwrap().close, 55_400.0);
    }

    #[test]
    fn test_header_only_is_empty() {
        let body = "[['날짜', '시가', '고가', '저가', '종가', '거래량', '외국인소진율']]";
        assert!(parse_sise_json(body).unwrap().is_empty());
        assert!(parse_sise_json("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_rows() {
        assert!(parse_sise_json("<html>error</html>").is_err());
        assert!(matches!(
            parse_sise_json("[[\"20230102\", 1, 2]]"),
            Err(StockError::ParseError(_))
        ));
        assert!(parse_sise_json("[[12345]]").is_err());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_live_prices() {
        let client = NaverPriceClient::new(&StockConfig::default()).unwrap();
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
