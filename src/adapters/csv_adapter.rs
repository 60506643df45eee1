//! CSV file market data adapter.
//!
//! Reads `<SYMBOL>.csv` files from a directory, one per ticker, with a header
//! row naming the columns (`Date`, `Open`, `High`, `Low`, `Close`,
//! `Adj Close`, `Volume`, any order, case-insensitive). `Adj Close` wins over
//! `Close` when both are present. Empty, `null` and `NaN` cells are missing
//! values. A missing file means the ticker is absent.

use crate::domain::config_validation::DATE_FORMAT;
use crate::domain::error::IndexboardError;
use crate::domain::ohlcv::{Field, OhlcvBar, RawFrame, RawSeries};
use crate::ports::market_data_port::MarketDataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

impl MarketDataPort for CsvAdapter {
    fn download(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeries, IndexboardError> {
        if !self.base_path.is_dir() {
            return Err(IndexboardError::Provider {
                reason: format!("data directory {} not found", self.base_path.display()),
            });
        }

        let mut series = RawSeries::new();
        for symbol in tickers {
            let path = self.csv_path(symbol);
            if !path.exists() {
                debug!(%symbol, path = %path.display(), "no csv file for ticker");
                continue;
            }
            let frame = match fs::read_to_string(&path) {
                Ok(content) => parse_frame(&content, start, end),
                Err(e) => RawFrame::Malformed {
                    reason: format!("failed to read {}: {}", path.display(), e),
                },
            };
            series.insert(symbol.clone(), frame);
        }
        Ok(series)
    }
}

#[derive(Default)]
struct ColumnIndex {
    date: Option<usize>,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: Option<usize>,
    adj_close: Option<usize>,
    volume: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut index = ColumnIndex::default();
        for (i, header) in headers.iter().enumerate() {
            match header.trim().to_lowercase().as_str() {
                "date" => index.date = Some(i),
                "open" => index.open = Some(i),
                "high" => index.high = Some(i),
                "low" => index.low = Some(i),
                "close" => index.close = Some(i),
                "adj close" | "adj_close" | "adjclose" => index.adj_close = Some(i),
                "volume" => index.volume = Some(i),
                _ => {}
            }
        }
        index
    }

    fn fields(&self) -> Vec<Field> {
        let mut fields = Vec::new();
        if self.open.is_some() {
            fields.push(Field::Open);
        }
        if self.high.is_some() {
            fields.push(Field::High);
        }
        if self.low.is_some() {
            fields.push(Field::Low);
        }
        if self.close.is_some() || self.adj_close.is_some() {
            fields.push(Field::Close);
        }
        if self.volume.is_some() {
            fields.push(Field::Volume);
        }
        fields
    }
}

fn parse_frame(content: &str, start: NaiveDate, end: NaiveDate) -> RawFrame {
    match parse_bars(content, start, end) {
        Ok((columns, bars)) => RawFrame::Table { columns, bars },
        Err(reason) => RawFrame::Malformed { reason },
    }
}

fn parse_bars(
    content: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(Vec<Field>, Vec<OhlcvBar>), String> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| format!("CSV header error: {}", e))?
        .clone();
    let index = ColumnIndex::from_headers(&headers);
    let date_col = index.date.ok_or_else(|| "missing date column".to_string())?;
    let close_col = index.adj_close.or(index.close);

    let mut bars = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| format!("CSV parse error: {}", e))?;

        let date_str = record.get(date_col).unwrap_or_default().trim();
        let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT)
            .map_err(|e| format!("invalid date {:?}: {}", date_str, e))?;
        if date < start || date > end {
            continue;
        }

        bars.push(OhlcvBar {
            date,
            open: cell(&record, index.open, "open")?,
            high: cell(&record, index.high, "high")?,
            low: cell(&record, index.low, "low")?,
            close: cell(&record, close_col, "close")?,
            volume: cell::<f64>(&record, index.volume, "volume")?.map(|v| v as i64),
        });
    }

    bars.sort_by_key(|b| b.date);
    Ok((index.fields(), bars))
}

fn cell<T: std::str::FromStr>(
    record: &csv::StringRecord,
    column: Option<usize>,
    name: &str,
) -> Result<Option<T>, String>
where
    T::Err: std::fmt::Display,
{
    let Some(raw) = column.and_then(|i| record.get(i)) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|e| format!("invalid {} value {:?}: {}", name, raw, e))
}
