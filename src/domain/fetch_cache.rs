//! Bounded LRU cache of provider responses keyed by (ticker set, start, end).
//!
//! Entries are kept in an `IndexMap` in recency order: the front is the least
//! recently used key, the back the most recent. Key equality is exact; a cached
//! range is never reused for an overlapping request.

use crate::domain::ohlcv::RawSeries;
use chrono::NaiveDate;
use indexmap::IndexMap;
use std::collections::BTreeSet;

pub const DEFAULT_CACHE_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey {
    pub tickers: BTreeSet<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchKey {
    pub fn new(tickers: &BTreeSet<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            tickers: tickers.clone(),
            start,
            end,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug)]
pub struct FetchCache {
    capacity: usize,
    entries: IndexMap<FetchKey, RawSeries>,
    stats: CacheStats,
}

impl Default for FetchCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl FetchCache {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: IndexMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn contains(&self, key: &FetchKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Looks up `key` and marks it most recently used.
    pub fn get(&mut self, key: &FetchKey) -> Option<&RawSeries> {
        match self.entries.shift_remove_entry(key) {
            Some((k, v)) => {
                self.stats.hits += 1;
                self.entries.insert(k, v);
                self.entries.last().map(|(_, v)| v)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Inserts or replaces `key`, evicting least recently used entries past capacity.
    pub fn insert(&mut self, key: FetchKey, value: RawSeries) {
        self.entries.shift_remove(&key);
        self.entries.insert(key, value);
        while self.entries.len() > self.capacity {
            if self.entries.shift_remove_index(0).is_some() {
                self.stats.evictions += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::{OhlcvBar, RawFrame};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn key(tickers: &[&str], start: u32, end: u32) -> FetchKey {
        let set: BTreeSet<String> = tickers.iter().map(|t| t.to_string()).collect();
        FetchKey::new(&set, date(start), date(end))
    }

    fn series(symbol: &str, close: f64) -> RawSeries {
        RawSeries::new().with_frame(
            symbol,
            RawFrame::full(vec![OhlcvBar::close_only(date(2), close)]),
        )
    }

    #[test]
    fn get_after_insert_hits() {
        let mut cache = FetchCache::new(4);
        cache.insert(key(&["^GSPC"], 1, 10), series("^GSPC", 1.0));
        assert_eq!(cache.get(&key(&["^GSPC"], 1, 10)), Some(&series("^GSPC", 1.0)));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn key_is_order_insensitive_over_tickers() {
        let mut cache = FetchCache::new(4);
        cache.insert(key(&["^GSPC", "^IXIC"], 1, 10), RawSeries::new());
        assert!(cache.get(&key(&["^IXIC", "^GSPC"], 1, 10)).is_some());
    }

    #[test]
    fn overlapping_range_is_a_miss() {
        let mut cache = FetchCache::new(4);
        cache.insert(key(&["^GSPC"], 1, 10), RawSeries::new());
        assert!(cache.get(&key(&["^GSPC"], 2, 9)).is_none());
        assert!(cache.get(&key(&["^GSPC"], 1, 11)).is_none());
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = FetchCache::new(2);
        cache.insert(key(&["A"], 1, 2), RawSeries::new());
        cache.insert(key(&["B"], 1, 2), RawSeries::new());
        // touch A so B becomes the oldest
        assert!(cache.get(&key(&["A"], 1, 2)).is_some());
        cache.insert(key(&["C"], 1, 2), RawSeries::new());

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&key(&["A"], 1, 2)));
        assert!(!cache.contains(&key(&["B"], 1, 2)));
        assert!(cache.contains(&key(&["C"], 1, 2)));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn reinsert_replaces_value() {
        let mut cache = FetchCache::new(2);
        cache.insert(key(&["A"], 1, 2), series("A", 1.0));
        cache.insert(key(&["A"], 1, 2), series("A", 2.0));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&key(&["A"], 1, 2)), Some(&series("A", 2.0)));
    }

    #[test]
    fn zero_capacity_holds_one_entry() {
        let mut cache = FetchCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.insert(key(&["A"], 1, 2), RawSeries::new());
        cache.insert(key(&["B"], 1, 2), RawSeries::new());
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&key(&["B"], 1, 2)));
    }
}
