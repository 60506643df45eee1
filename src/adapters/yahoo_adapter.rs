//! Yahoo Finance chart API adapter.
//!
//! Issues one `v8/finance/chart` request per ticker inside a single
//! [`MarketDataPort::download`] call. Daily bars are dated in the exchange's
//! local time (`meta.gmtoffset`). The adjusted close replaces the raw close
//! whenever the response carries one.

use crate::domain::error::IndexboardError;
use crate::domain::ohlcv::{Field, OhlcvBar, RawFrame, RawSeries};
use crate::ports::market_data_port::MarketDataPort;
use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::Url;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("indexboard/", env!("CARGO_PKG_VERSION"));

pub struct YahooAdapter {
    client: Client,
    base_url: Url,
}

impl YahooAdapter {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self, IndexboardError> {
        let base_url = Url::parse(base_url.trim())
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| IndexboardError::ConfigInvalid {
                section: "provider".to_string(),
                key: "base_url".to_string(),
                reason: format!("not an http(s) base URL: {}", base_url),
            })?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| IndexboardError::Provider {
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client, base_url })
    }

    /// `<base>/v8/finance/chart/<symbol>` with the symbol escaped as one path
    /// segment.
    fn chart_url(&self, symbol: &str) -> Url {
        let mut url = self.base_url.clone();
        // always Ok: `new` rejects cannot-be-a-base URLs
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v8", "finance", "chart", symbol]);
        }
        url
    }

    fn fetch_one(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawFrame, reqwest::Error> {
        let (period1, period2) = period_bounds(start, end);
        let response = self
            .client
            .get(self.chart_url(symbol))
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "history".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()?;

        let status = response.status();
        let body = response.text()?;
        debug!(%symbol, %status, bytes = body.len(), "chart response");

        let frame = parse_chart_response(&body, start, end);
        if !status.is_success() {
            if let RawFrame::Table { .. } = frame {
                return Ok(RawFrame::Malformed {
                    reason: format!("HTTP {}", status),
                });
            }
        }
        Ok(frame)
    }
}

impl MarketDataPort for YahooAdapter {
    fn download(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeries, IndexboardError> {
        let mut series = RawSeries::new();
        let mut last_error = None;

        for symbol in tickers {
            match self.fetch_one(symbol, start, end) {
                Ok(frame) => series.insert(symbol.clone(), frame),
                Err(e) => {
                    warn!(%symbol, error = %e, "chart request failed");
                    last_error = Some(e);
                }
            }
        }

        // nothing came back at all: report it so the failure is not cached
        match last_error {
            Some(e) if series.is_empty() => Err(IndexboardError::Provider {
                reason: e.to_string(),
            }),
            _ => Ok(series),
        }
    }
}

/// Unix timestamps covering `start..=end` as the half-open range the API expects.
fn period_bounds(start: NaiveDate, end: NaiveDate) -> (i64, i64) {
    let from = start.and_time(NaiveTime::MIN).and_utc().timestamp();
    let to = end
        .succ_opt()
        .unwrap_or(end)
        .and_time(NaiveTime::MIN)
        .and_utc()
        .timestamp();
    (from, to)
}

#[derive(Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Meta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Deserialize, Default)]
struct Meta {
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Deserialize)]
struct Quote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize)]
struct AdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

/// Turns a chart API body into a frame, keeping bars within `start..=end`.
pub fn parse_chart_response(body: &str, start: NaiveDate, end: NaiveDate) -> RawFrame {
    let envelope: ChartEnvelope = match serde_json::from_str(body) {
        Ok(e) => e,
        Err(e) => {
            return RawFrame::Malformed {
                reason: format!("unexpected response: {}", e),
            };
        }
    };

    if let Some(err) = envelope.chart.error {
        return RawFrame::Malformed {
            reason: format!("{}: {}", err.code, err.description),
        };
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return RawFrame::Malformed {
            reason: "empty chart result".to_string(),
        };
    };

    let quote = result.indicators.quote.into_iter().next();
    let adjclose = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .and_then(|a| a.adjclose);

    let (open, high, low, close, volume) = match quote {
        Some(q) => (q.open, q.high, q.low, q.close, q.volume),
        None => (None, None, None, None, None),
    };
    let close = adjclose.or(close);

    let mut columns = Vec::new();
    for (field, present) in [
        (Field::Open, open.is_some()),
        (Field::High, high.is_some()),
        (Field::Low, low.is_some()),
        (Field::Close, close.is_some()),
        (Field::Volume, volume.is_some()),
    ] {
        if present {
            columns.push(field);
        }
    }

    let at = |column: &Option<Vec<Option<f64>>>, i: usize| -> Option<f64> {
        column.as_ref().and_then(|v| v.get(i).copied().flatten())
    };

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let Some(local) = DateTime::from_timestamp(ts + result.meta.gmtoffset, 0) else {
            continue;
        };
        let date = local.date_naive();
        if date < start || date > end {
            continue;
        }
        bars.push(OhlcvBar {
            date,
            open: at(&open, i),
            high: at(&high, i),
            low: at(&low, i),
            close: at(&close, i),
            volume: at(&volume, i).map(|v| v as i64),
        });
    }
    bars.sort_by_key(|b| b.date);

    RawFrame::Table { columns, bars }
}
