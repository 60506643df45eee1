//! Data fetcher: batched provider download fronted by a [`FetchCache`].

use crate::domain::fetch_cache::{CacheStats, FetchCache, FetchKey};
use crate::domain::ohlcv::RawSeries;
use crate::ports::market_data_port::MarketDataPort;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

pub struct Fetcher<P> {
    port: P,
    cache: FetchCache,
}

impl<P: MarketDataPort> Fetcher<P> {
    pub fn new(port: P, cache: FetchCache) -> Self {
        Self { port, cache }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Returns the provider data for `tickers` over `start..=end`.
    ///
    /// Never fails: a provider error is logged and yields an empty
    /// [`RawSeries`], which is not cached so the next run tries again.
    pub fn fetch(
        &mut self,
        tickers: &BTreeSet<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RawSeries {
        if tickers.is_empty() {
            return RawSeries::new();
        }

        let key = FetchKey::new(tickers, start, end);
        if let Some(cached) = self.cache.get(&key) {
            debug!(tickers = tickers.len(), %start, %end, "fetch cache hit");
            return cached.clone();
        }

        info!(tickers = tickers.len(), %start, %end, "downloading index data");
        let symbols: Vec<String> = tickers.iter().cloned().collect();
        match self.port.download(&symbols, start, end) {
            Ok(series) => {
                self.cache.insert(key, series.clone());
                series
            }
            Err(e) => {
                warn!(error = %e, "provider request failed, treating every ticker as absent");
                RawSeries::new()
            }
        }
    }
}
