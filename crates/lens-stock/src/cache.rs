//! Caching layer for price series to reduce provider calls

use crate::directory::Ticker;
use crate::series::{DateRange, PriceSeries};
use cached::{Cached, TimedCache};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Cache key for a price history request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ticker: Ticker,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CacheKey {
    pub fn new(ticker: &Ticker, range: &DateRange) -> Self {
        Self {
            ticker: ticker.clone(),
            start: range.start(),
            end: range.end(),
        }
    }
}

/// Thread-safe, time-bounded cache of fetched price series
pub struct PriceCache {
    cache: Arc<RwLock<TimedCache<CacheKey, Arc<PriceSeries>>>>,
}

impl PriceCache {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Get a value from the cache
    pub async fn get(&self, key: &CacheKey) -> Option<Arc<PriceSeries>> {
        // TimedCache evicts expired entries on read, so this needs the write lock
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    /// Insert a value into the cache
    pub async fn insert(&self, key: CacheKey, value: Arc<PriceSeries>) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Get or fetch a value using the provided fetcher function
    ///
    /// Only successful fetches are cached; an empty series is a success.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: CacheKey,
        fetcher: F,
    ) -> Result<Arc<PriceSeries>, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<PriceSeries, E>>,
    {
        if let Some(value) = self.get(&key).await {
            tracing::debug!("Cache hit for key: {:?}", key);
            return Ok(value);
        }

        tracing::debug!("Cache miss for key: {:?}", key);

        let value = Arc::new(fetcher().await?);
        self.insert(key, Arc::clone(&value)).await;

        Ok(value)
    }

    /// Drop every cached series, returning how many were held
    pub async fn clear(&self) -> usize {
        let mut cache = self.cache.write().await;
        let evicted = cache.cache_size();
        cache.cache_clear();
        evicted
    }
}

impl Clone for PriceCache {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}
