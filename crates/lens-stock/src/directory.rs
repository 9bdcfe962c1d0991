//! Listed-company directory and its process-wide snapshot cache
//!
//! The directory maps company display names to 6-digit KRX ticker codes. It is
//! loaded through a [`DirectoryLoader`] and held by a [`DirectoryCache`], which
//! hands out immutable [`CompanyDirectory`] snapshots behind an `Arc`. Readers
//! never block each other; a refresh swaps the whole snapshot at once.

use crate::error::{Result, StockError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

/// Number of digits in a KRX ticker code
pub const TICKER_LEN: usize = 6;

/// A 6-digit, zero-padded KRX ticker code
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Accept exactly six ASCII decimal digits
    pub fn parse(input: &str) -> Option<Self> {
        (input.len() == TICKER_LEN && input.bytes().all(|b| b.is_ascii_digit()))
            .then(|| Self(input.to_string()))
    }

    /// Accept a numeric listing code, zero-padding it to six digits
    pub fn from_listing_code(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.is_empty() || code.len() > TICKER_LEN || !code.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        Some(Self(format!("{code:0>6}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Ticker {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Ticker::parse(&value).ok_or_else(|| format!("'{value}' is not a 6-digit ticker"))
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

/// One row of the company listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyListing {
    pub name: String,
    pub ticker: Ticker,
}

/// Immutable name -> ticker mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyDirectory {
    by_name: HashMap<String, Vec<Ticker>>,
    len: usize,
}

impl CompanyDirectory {
    /// Build a directory from listing rows
    ///
    /// Companies sharing a display name keep all of their tickers, sorted
    /// ascending, so lookups resolve them to the lowest code.
    pub fn from_listings(listings: impl IntoIterator<Item = CompanyListing>) -> Self {
        let mut by_name: HashMap<String, Vec<Ticker>> = HashMap::new();
        for listing in listings {
            by_name.entry(listing.name).or_default().push(listing.ticker);
        }
        let mut len = 0;
        for tickers in by_name.values_mut() {
            tickers.sort();
            tickers.dedup();
            len += tickers.len();
        }
        Self { by_name, len }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Exact, case-sensitive name lookup
    pub fn lookup(&self, name: &str) -> Option<&Ticker> {
        self.by_name.get(name).and_then(|tickers| tickers.first())
    }

    /// Every ticker listed under `name`, lowest first
    pub fn tickers_for(&self, name: &str) -> &[Ticker] {
        self.by_name.get(name).map_or(&[], Vec::as_slice)
    }

    /// Number of (name, ticker) entries
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Source of the company directory
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryLoader: Send + Sync {
    async fn load(&self) -> Result<CompanyDirectory>;
}

/// When a cached directory snapshot goes stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RefreshPolicy {
    /// Keep the first successful snapshot until explicitly refreshed
    #[default]
    Manual,
    /// Refetch once the snapshot is older than the given duration
    Ttl(Duration),
}

impl RefreshPolicy {
    fn is_fresh(self, loaded_at: Instant) -> bool {
        match self {
            RefreshPolicy::Manual => true,
            RefreshPolicy::Ttl(ttl) => loaded_at.elapsed() < ttl,
        }
    }
}

/// Whether a snapshot reflects a successful load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryStatus {
    Available,
    /// The load failed; the snapshot is empty and says nothing about which companies exist
    Unavailable(String),
}

/// A directory plus the outcome of the load that produced it
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    pub directory: Arc<CompanyDirectory>,
    pub status: DirectoryStatus,
}

impl DirectorySnapshot {
    pub fn is_available(&self) -> bool {
        self.status == DirectoryStatus::Available
    }

    /// The directory, or `DirectoryUnavailable` if the load failed
    pub fn require(&self) -> Result<&CompanyDirectory> {
        match &self.status {
            DirectoryStatus::Available => Ok(&self.directory),
            DirectoryStatus::Unavailable(reason) => {
                Err(StockError::DirectoryUnavailable(reason.clone()))
            }
        }
    }
}

struct CachedDirectory {
    directory: Arc<CompanyDirectory>,
    loaded_at: Instant,
}

/// Process-wide directory cache with single-writer refresh
pub struct DirectoryCache {
    loader: Arc<dyn DirectoryLoader>,
    policy: RefreshPolicy,
    current: RwLock<Option<CachedDirectory>>,
    refresh: Mutex<()>,
}

impl DirectoryCache {
    pub fn new(loader: Arc<dyn DirectoryLoader>, policy: RefreshPolicy) -> Self {
        Self {
            loader,
            policy,
            current: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    /// Current snapshot, loading it first when missing or stale
    ///
    /// Never fails: a transport or parse error, or a listing with no
    /// companies, yields an empty snapshot marked
    /// [`DirectoryStatus::Unavailable`], and is not cached.
    pub async fn load(&self) -> DirectorySnapshot {
        if let Some(directory) = self.fresh().await {
            tracing::debug!("Directory cache hit ({} entries)", directory.len());
            return Self::available(directory);
        }

        let _guard = self.refresh.lock().await;
        // another task may have refreshed while we waited
        if let Some(directory) = self.fresh().await {
            return Self::available(directory);
        }

        tracing::debug!("Directory cache miss, loading listing");
        match self.reload().await {
            Ok(directory) => Self::available(directory),
            Err(e) => {
                tracing::warn!("Company directory unavailable: {}", e);
                DirectorySnapshot {
                    directory: Arc::new(CompanyDirectory::empty()),
                    status: DirectoryStatus::Unavailable(e.to_string()),
                }
            }
        }
    }

    /// Fetch a new snapshot and swap it in, regardless of freshness
    ///
    /// On failure the previous snapshot, if any, stays in place and the
    /// failure is returned as `DirectoryUnavailable`.
    pub async fn refresh(&self) -> Result<Arc<CompanyDirectory>> {
        let _guard = self.refresh.lock().await;
        self.reload().await.map_err(|e| {
            tracing::warn!("Company directory refresh failed, keeping previous snapshot: {}", e);
            match e {
                unavailable @ StockError::DirectoryUnavailable(_) => unavailable,
                other => StockError::DirectoryUnavailable(other.to_string()),
            }
        })
    }

    /// Load through the loader and publish the result; caller holds `refresh`
    async fn reload(&self) -> Result<Arc<CompanyDirectory>> {
        let directory = self.loader.load().await?;
        if directory.is_empty() {
            return Err(StockError::DirectoryUnavailable(
                "listing contained no companies".to_string(),
            ));
        }

        let directory = Arc::new(directory);
        tracing::info!("Loaded company directory with {} entries", directory.len());
        *self.current.write().await = Some(CachedDirectory {
            directory: Arc::clone(&directory),
            loaded_at: Instant::now(),
        });
        Ok(directory)
    }

    /// Whether a snapshot is currently cached, fresh or not
    pub async fn is_cached(&self) -> bool {
        self.current.read().await.is_some()
    }

    async fn fresh(&self) -> Option<Arc<CompanyDirectory>> {
        let current = self.current.read().await;
        current
            .as_ref()
            .filter(|cached| self.policy.is_fresh(cached.loaded_at))
            .map(|cached| Arc::clone(&cached.directory))
    }

    fn available(directory: Arc<CompanyDirectory>) -> DirectorySnapshot {
        DirectorySnapshot {
            directory,
            status: DirectoryStatus::Available,
        }
    }
}
