//! Market data access port.

use crate::domain::error::IndexboardError;
use crate::domain::ohlcv::RawSeries;
use chrono::NaiveDate;

/// A source of daily OHLCV history for a batch of tickers.
///
/// One call covers every requested ticker over `start..=end`. Per-ticker
/// problems belong in the returned [`RawSeries`] (absent or malformed frames);
/// `Err` is reserved for failures of the request as a whole.
pub trait MarketDataPort {
    fn download(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeries, IndexboardError>;
}

impl<T: MarketDataPort + ?Sized> MarketDataPort for Box<T> {
    fn download(
        &self,
        tickers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeries, IndexboardError> {
        (**self).download(tickers, start, end)
    }
}
