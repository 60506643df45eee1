#![allow(dead_code)]

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use indexboard::domain::error::IndexboardError;
pub use indexboard::domain::ohlcv::{OhlcvBar, RawFrame, RawSeries};
use indexboard::ports::market_data_port::MarketDataPort;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Provider double: serves canned frames, counts calls and records requests.
pub struct MockMarketDataPort {
    pub frames: HashMap<String, RawFrame>,
    pub failure: Option<String>,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockMarketDataPort {
    pub fn new() -> Self {
        Self {
            frames: HashMap::new(),
            failure: None,
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_frame(mut self, symbol: &str, frame: RawFrame) -> Self {
        self.frames.insert(symbol.to_string(), frame);
        self
    }

    pub fn with_closes(self, symbol: &str, closes: &[(&str, f64)]) -> Self {
        self.with_frame(symbol, close_frame(closes))
    }

    /// Every download fails as a whole.
    pub fn failing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Shared counter that stays readable after the port is boxed away.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests.lock().unwrap().clone()
    }
}

impl MarketDataPort for MockMarketDataPort {
    fn download(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeries, IndexboardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(tickers.to_vec());

        if let Some(reason) = &self.failure {
            return Err(IndexboardError::Provider {
                reason: reason.clone(),
            });
        }

        let mut series = RawSeries::new();
        for ticker in tickers {
            if let Some(frame) = self.frames.get(ticker) {
                series.insert(ticker.clone(), in_range(frame, start, end));
            }
        }
        Ok(series)
    }
}

fn in_range(frame: &RawFrame, start: NaiveDate, end: NaiveDate) -> RawFrame {
    match frame {
        RawFrame::Table { columns, bars } => RawFrame::Table {
            columns: columns.clone(),
            bars: bars
                .iter()
                .filter(|b| b.date >= start && b.date <= end)
                .cloned()
                .collect(),
        },
        malformed => malformed.clone(),
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn close_frame(closes: &[(&str, f64)]) -> RawFrame {
    RawFrame::full(
        closes
            .iter()
            .map(|&(d, c)| OhlcvBar::close_only(date(d), c))
            .collect(),
    )
}

/// `count` weekday closes starting at `start`, drifting by `step` per day with
/// a small alternating wobble so returns are never constant.
pub fn weekday_closes(start: &str, count: usize, first: f64, step: f64) -> RawFrame {
    let mut bars = Vec::with_capacity(count);
    let mut day = date(start);
    let mut close = first;
    while bars.len() < count {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            bars.push(OhlcvBar::close_only(day, close));
            let wobble = if bars.len() % 2 == 0 { 0.4 } else { -0.3 };
            close += step + wobble;
        }
        day += Duration::days(1);
    }
    RawFrame::full(bars)
}
