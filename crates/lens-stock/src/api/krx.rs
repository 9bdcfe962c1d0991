//! KRX KIND listed-company directory client
//!
//! The KIND "download" endpoint serves an EUC-KR encoded HTML page holding a
//! single table of every listed company. Only the company name (`회사명`) and
//! ticker code (`종목코드`) columns are used.

use super::{SharedRateLimiter, http_client, rate_limiter};
use crate::config::StockConfig;
use crate::directory::{CompanyDirectory, CompanyListing, DirectoryLoader, Ticker};
use crate::error::{Result, StockError};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

/// Header of the company name column
pub const NAME_COLUMN: &str = "회사명";

/// Header of the ticker code column
pub const CODE_COLUMN: &str = "종목코드";

/// KRX KIND listing client
pub struct KrxListingClient {
    client: Client,
    url: String,
    rate_limiter: SharedRateLimiter,
}

impl KrxListingClient {
    pub fn new(config: &StockConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(config)?,
            url: config.listing_url.clone(),
            rate_limiter: rate_limiter(config.requests_per_second),
        })
    }

    /// Download and parse the listing
    pub async fn fetch_listings(&self) -> Result<Vec<CompanyListing>> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| StockError::ProviderError(format!("KRX listing request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(StockError::ProviderError(format!(
                "KRX listing error: {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        let html = decode_euc_kr(&bytes);
        parse_listing(&html)
    }
}

#[async_trait]
impl DirectoryLoader for KrxListingClient {
    async fn load(&self) -> Result<CompanyDirectory> {
        let listings = self.fetch_listings().await?;
        Ok(CompanyDirectory::from_listings(listings))
    }
}

/// Decode an EUC-KR body, replacing malformed sequences
pub fn decode_euc_kr(bytes: &[u8]) -> String {
    let (text, _, had_errors) = encoding_rs::EUC_KR.decode(bytes);
    if had_errors {
        tracing::warn!("KRX listing contained malformed EUC-KR sequences");
    }
    text.into_owned()
}

/// Extract (name, ticker) rows from the listing table
///
/// The first row of the first table is the header. Rows whose code is not a
/// numeric KRX code are skipped. A table left with no company rows is an
/// error, never an empty listing.
pub fn parse_listing(html: &str) -> Result<Vec<CompanyListing>> {
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("th, td")?;

    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| StockError::ParseError("listing page has no table".to_string()))?;

    let mut rows = table.select(&row_sel);
    let header: Vec<String> = rows
        .next()
        .map(|row| row.select(&cell_sel).map(cell_text).collect())
        .unwrap_or_default();

    let column = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| StockError::ParseError(format!("listing table has no '{name}' column")))
    };
    let name_idx = column(NAME_COLUMN)?;
    let code_idx = column(CODE_COLUMN)?;

    let mut listings = Vec::new();
    let mut skipped = 0usize;
    for row in rows {
        let cells: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
        let (Some(name), Some(code)) = (cells.get(name_idx), cells.get(code_idx)) else {
            skipped += 1;
            continue;
        };
        match Ticker::from_listing_code(code) {
            Some(ticker) if !name.is_empty() => listings.push(CompanyListing {
                name: name.clone(),
                ticker,
            }),
            _ => {
                tracing::debug!("Skipping listing row '{}' with code '{}'", name, code);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        tracing::debug!("Skipped {} listing rows without a numeric code", skipped);
    }
    if listings.is_empty() {
        return Err(StockError::ParseError(
            "listing table has no company rows".to_string(),
        ));
    }
    Ok(listings)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| StockError::ParseError(format!("bad selector '{css}': {e:?}")))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}
