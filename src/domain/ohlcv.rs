//! Raw provider data: OHLCV bars per ticker as returned by a market data port.
//!
//! Providers report gaps as missing fields, so every price field is optional.
//! A ticker's table may also come back malformed or without a close column;
//! those cases are represented here and classified by the price table builder.

use chrono::NaiveDate;
use std::collections::HashMap;

/// Columns a provider table may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Open,
    High,
    Low,
    Close,
    Volume,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<i64>,
}

impl OhlcvBar {
    /// A bar carrying only a close price.
    pub fn close_only(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close: Some(close),
            volume: None,
        }
    }

    /// Close price when present and finite.
    pub fn usable_close(&self) -> Option<f64> {
        self.close.filter(|c| c.is_finite())
    }
}

/// One ticker's table as delivered by the provider.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFrame {
    Table { columns: Vec<Field>, bars: Vec<OhlcvBar> },
    Malformed { reason: String },
}

impl RawFrame {
    /// A well-formed table with all OHLCV columns.
    pub fn full(bars: Vec<OhlcvBar>) -> Self {
        RawFrame::Table {
            columns: vec![
                Field::Open,
                Field::High,
                Field::Low,
                Field::Close,
                Field::Volume,
            ],
            bars,
        }
    }

    pub fn has_column(&self, field: Field) -> bool {
        match self {
            RawFrame::Table { columns, .. } => columns.contains(&field),
            RawFrame::Malformed { .. } => false,
        }
    }
}

/// Provider response for one batched request, keyed by ticker symbol.
/// Tickers the provider returned nothing for are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSeries {
    frames: HashMap<String, RawFrame>,
}

impl RawSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, frame: RawFrame) {
        self.frames.insert(symbol.into(), frame);
    }

    pub fn with_frame(mut self, symbol: impl Into<String>, frame: RawFrame) -> Self {
        self.insert(symbol, frame);
        self
    }

    pub fn get(&self, symbol: &str) -> Option<&RawFrame> {
        self.frames.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
