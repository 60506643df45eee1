//! Dashboard pipeline: selection → fetch → price table → {normalize, correlate}.
//!
//! Every run starts from scratch; only the fetcher's cache carries over.

use crate::domain::correlation::{self, CorrelationAnalysis};
use crate::domain::error::IndexboardError;
use crate::domain::fetcher::Fetcher;
use crate::domain::normalize;
use crate::domain::price_table::{build_price_table, NormalizedTable, PriceTable};
use crate::domain::registry::IndexRegistry;
use crate::domain::selection::Selection;
use crate::ports::market_data_port::MarketDataPort;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub selection: Selection,
    pub prices: PriceTable,
    pub normalized: NormalizedTable,
    pub correlation: CorrelationAnalysis,
    pub warnings: Vec<String>,
}

impl DashboardView {
    pub fn strongest_line(&self) -> Option<String> {
        self.correlation
            .extremes
            .as_ref()
            .map(|e| format!("Strongest correlation: {}", e.strongest))
    }

    pub fn weakest_line(&self) -> Option<String> {
        self.correlation
            .extremes
            .as_ref()
            .map(|e| format!("Weakest correlation: {}", e.weakest))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardOutcome {
    Ready(DashboardView),
    NoValidData {
        selection: Selection,
        warnings: Vec<String>,
    },
}

impl DashboardOutcome {
    pub fn warnings(&self) -> &[String] {
        match self {
            DashboardOutcome::Ready(view) => &view.warnings,
            DashboardOutcome::NoValidData { warnings, .. } => warnings,
        }
    }

    pub fn selection(&self) -> &Selection {
        match self {
            DashboardOutcome::Ready(view) => &view.selection,
            DashboardOutcome::NoValidData { selection, .. } => selection,
        }
    }

    pub fn view(&self) -> Option<&DashboardView> {
        match self {
            DashboardOutcome::Ready(view) => Some(view),
            DashboardOutcome::NoValidData { .. } => None,
        }
    }

    pub fn into_result(self) -> Result<DashboardView, IndexboardError> {
        match self {
            DashboardOutcome::Ready(view) => Ok(view),
            DashboardOutcome::NoValidData { .. } => Err(IndexboardError::NoValidData),
        }
    }
}

pub fn build_dashboard<P: MarketDataPort>(
    registry: &IndexRegistry,
    fetcher: &mut Fetcher<P>,
    selection: &Selection,
) -> DashboardOutcome {
    let tickers = selection.tickers(registry);
    let raw = fetcher.fetch(&tickers, selection.start_date, selection.end_date);

    let build = build_price_table(registry, &selection.display_names, &raw);
    let mut warnings: Vec<String> = build.skipped.iter().map(|s| s.to_string()).collect();

    if build.table.is_empty() {
        return DashboardOutcome::NoValidData {
            selection: selection.clone(),
            warnings,
        };
    }

    info!(
        indices = build.table.column_count(),
        dates = build.table.row_count(),
        "price table ready"
    );

    let normalized = normalize::normalize(&build.table);
    warnings.extend(normalized.skipped.iter().map(|s| s.to_string()));
    let correlation = correlation::analyze(&build.table);

    DashboardOutcome::Ready(DashboardView {
        selection: selection.clone(),
        prices: build.table,
        normalized: normalized.table,
        correlation,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fetch_cache::FetchCache;
    use crate::domain::ohlcv::{OhlcvBar, RawFrame, RawSeries};
    use chrono::NaiveDate;

    struct FixedPort(RawSeries);

    impl MarketDataPort for FixedPort {
        fn download(
            &self,
            _tickers: &[String],
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<RawSeries, IndexboardError> {
            Ok(self.0.clone())
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, d).unwrap()
    }

    fn frame(closes: &[(u32, f64)]) -> RawFrame {
        RawFrame::full(closes.iter().map(|&(d, c)| OhlcvBar::close_only(day(d), c)).collect())
    }

    fn selection(names: &[&str]) -> Selection {
        Selection::new(names.iter().map(|s| s.to_string()).collect(), day(1), day(10)).unwrap()
    }

    #[test]
    fn empty_selection_has_no_valid_data() {
        let mut fetcher = Fetcher::new(FixedPort(RawSeries::new()), FetchCache::default());
        let outcome = build_dashboard(&IndexRegistry::new(), &mut fetcher, &selection(&[]));
        assert!(outcome.view().is_none());
        assert!(outcome.warnings().is_empty());
        assert!(matches!(outcome.into_result(), Err(IndexboardError::NoValidData)));
    }

    #[test]
    fn ready_view_has_lines_for_two_indices() {
        let raw = RawSeries::new()
            .with_frame("^GSPC", frame(&[(3, 4796.56), (4, 4793.54), (5, 4700.58), (6, 4696.05)]))
            .with_frame("^IXIC", frame(&[(3, 15832.8), (4, 15622.7), (5, 15100.2), (6, 15080.9)]));
        let mut fetcher = Fetcher::new(FixedPort(raw), FetchCache::default());

        let outcome = build_dashboard(
            &IndexRegistry::new(),
            &mut fetcher,
            &selection(&["S&P 500 (US)", "NASDAQ Composite (US)"]),
        );
        let view = outcome.into_result().unwrap();

        assert_eq!(view.prices.column_count(), 2);
        assert!(view.strongest_line().unwrap().starts_with("Strongest correlation: S&P 500 (US) ↔ NASDAQ Composite (US) = "));
        assert!(view.weakest_line().unwrap().starts_with("Weakest correlation: "));
    }

    #[test]
    fn skipped_indices_become_warnings() {
        let raw = RawSeries::new().with_frame("^GSPC", frame(&[(3, 1.0)]));
        let mut fetcher = Fetcher::new(FixedPort(raw), FetchCache::default());

        let outcome = build_dashboard(
            &IndexRegistry::new(),
            &mut fetcher,
            &selection(&["S&P 500 (US)", "DAX (Germany)"]),
        );

        assert_eq!(outcome.warnings().len(), 1);
        assert!(outcome.warnings()[0].contains("DAX (Germany)"));
        assert!(outcome.view().is_some());
    }
}
