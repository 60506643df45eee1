//! Price table builder: close series per selected index on one date axis.
//!
//! Each selected index is classified into an [`ExtractOutcome`]. Included
//! series are then aligned by [`align_and_fill`]: the axis is the sorted union
//! of all dates, holes are filled forward first, then any leading holes are
//! filled backward from the earliest following observation.

use crate::domain::ohlcv::{Field, RawFrame, RawSeries};
use crate::domain::registry::IndexRegistry;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Named numeric columns over a shared, strictly increasing date axis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DateTable {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

pub type PriceTable = DateTable;
pub type NormalizedTable = DateTable;
pub type ReturnsTable = DateTable;

impl DateTable {
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<Column>) -> Self {
        debug_assert!(columns.iter().all(|c| c.values.len() == dates.len()));
        debug_assert!(dates.windows(2).all(|w| w[0] < w[1]));
        Self { dates, columns }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// A table with no columns; it has nothing to chart or correlate.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.dates.len() {
            return None;
        }
        Some(self.columns.iter().map(|c| c.values[index]).collect())
    }
}

/// Close prices of one index, missing values already dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseSeries {
    pub name: String,
    pub points: BTreeMap<NaiveDate, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    UnknownIndex,
    Absent,
    Malformed { reason: String },
    MissingCloseColumn,
    NoCloseValues,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnknownIndex => write!(f, "not in the index catalog"),
            SkipReason::Absent => write!(f, "no data returned by provider"),
            SkipReason::Malformed { reason } => write!(f, "malformed provider data: {reason}"),
            SkipReason::MissingCloseColumn => write!(f, "no close price column"),
            SkipReason::NoCloseValues => write!(f, "no close prices in range"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractOutcome {
    Included(CloseSeries),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedIndex {
    pub display_name: String,
    pub reason: SkipReason,
}

impl fmt::Display for SkippedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to load: {} ({})", self.display_name, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceTableBuild {
    pub table: PriceTable,
    pub skipped: Vec<SkippedIndex>,
}

/// Classifies one ticker's provider frame.
pub fn extract_close(display_name: &str, frame: Option<&RawFrame>) -> ExtractOutcome {
    let bars = match frame {
        None => return ExtractOutcome::Skipped(SkipReason::Absent),
        Some(RawFrame::Malformed { reason }) => {
            return ExtractOutcome::Skipped(SkipReason::Malformed {
                reason: reason.clone(),
            });
        }
        Some(f) if !f.has_column(Field::Close) => {
            return ExtractOutcome::Skipped(SkipReason::MissingCloseColumn);
        }
        Some(RawFrame::Table { bars, .. }) => bars,
    };

    let points: BTreeMap<NaiveDate, f64> = bars
        .iter()
        .filter_map(|bar| bar.usable_close().map(|close| (bar.date, close)))
        .collect();

    if points.is_empty() {
        return ExtractOutcome::Skipped(SkipReason::NoCloseValues);
    }

    ExtractOutcome::Included(CloseSeries {
        name: display_name.to_string(),
        points,
    })
}

/// Builds the aligned price table for `display_names` in the given order.
pub fn build_price_table(
    registry: &IndexRegistry,
    display_names: &[String],
    raw: &RawSeries,
) -> PriceTableBuild {
    let mut included = Vec::with_capacity(display_names.len());
    let mut skipped = Vec::new();

    for name in display_names {
        let outcome = match registry.lookup_symbol(name) {
            Ok(symbol) => extract_close(name, raw.get(symbol)),
            Err(_) => ExtractOutcome::Skipped(SkipReason::UnknownIndex),
        };

        match outcome {
            ExtractOutcome::Included(series) => included.push(series),
            ExtractOutcome::Skipped(reason) => {
                warn!(index = %name, %reason, "skipping index");
                skipped.push(SkippedIndex {
                    display_name: name.clone(),
                    reason,
                });
            }
        }
    }

    PriceTableBuild {
        table: align_and_fill(included),
        skipped,
    }
}

/// Aligns series on the union of their dates and fills holes forward, then backward.
///
/// Every input series must carry at least one point; the result then has no holes.
pub fn align_and_fill(series: Vec<CloseSeries>) -> PriceTable {
    let dates: Vec<NaiveDate> = series
        .iter()
        .flat_map(|s| s.points.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let columns = series
        .into_iter()
        .filter(|s| !s.points.is_empty())
        .map(|s| {
            let sparse: Vec<Option<f64>> = dates.iter().map(|d| s.points.get(d).copied()).collect();
            Column {
                name: s.name,
                values: fill_forward_then_backward(&sparse),
            }
        })
        .collect();

    DateTable::new(dates, columns)
}

fn fill_forward_then_backward(sparse: &[Option<f64>]) -> Vec<f64> {
    let mut filled: Vec<Option<f64>> = Vec::with_capacity(sparse.len());
    let mut last = None;
    for value in sparse {
        if value.is_some() {
            last = *value;
        }
        filled.push(last);
    }

    let first_seen = filled.iter().flatten().next().copied();
    filled
        .into_iter()
        .map(|v| v.or(first_seen).unwrap_or(f64::NAN))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::OhlcvBar;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, d).unwrap()
    }

    fn series(name: &str, points: &[(u32, f64)]) -> CloseSeries {
        CloseSeries {
            name: name.to_string(),
            points: points.iter().map(|&(d, v)| (day(d), v)).collect(),
        }
    }

    fn frame(points: &[(u32, Option<f64>)]) -> RawFrame {
        RawFrame::full(
            points
                .iter()
                .map(|&(d, close)| OhlcvBar {
                    date: day(d),
                    open: None,
                    high: None,
                    low: None,
                    close,
                    volume: None,
                })
                .collect(),
        )
    }

    #[test]
    fn fill_forward_then_backward_contract() {
        let filled = fill_forward_then_backward(&[None, None, Some(3.0), None, Some(5.0), None]);
        assert_eq!(filled, vec![3.0, 3.0, 3.0, 3.0, 5.0, 5.0]);
    }

    #[test]
    fn align_uses_union_of_dates() {
        let table = align_and_fill(vec![
            series("A", &[(3, 10.0), (5, 11.0)]),
            series("B", &[(4, 20.0), (6, 21.0)]),
        ]);
        assert_eq!(table.dates(), &[day(3), day(4), day(5), day(6)]);
        assert_eq!(table.column("A").unwrap().values, vec![10.0, 10.0, 11.0, 11.0]);
        assert_eq!(table.column("B").unwrap().values, vec![20.0, 20.0, 20.0, 21.0]);
    }

    #[test]
    fn align_keeps_input_column_order() {
        let table = align_and_fill(vec![series("Z", &[(3, 1.0)]), series("A", &[(3, 2.0)])]);
        assert_eq!(table.names(), vec!["Z", "A"]);
    }

    #[test]
    fn align_no_series_is_empty() {
        let table = align_and_fill(vec![]);
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn extract_absent() {
        assert_eq!(
            extract_close("S&P 500 (US)", None),
            ExtractOutcome::Skipped(SkipReason::Absent)
        );
    }

    #[test]
    fn extract_malformed() {
        let frame = RawFrame::Malformed {
            reason: "unexpected JSON".into(),
        };
        assert_eq!(
            extract_close("S&P 500 (US)", Some(&frame)),
            ExtractOutcome::Skipped(SkipReason::Malformed {
                reason: "unexpected JSON".into()
            })
        );
    }

    #[test]
    fn extract_missing_close_column() {
        let frame = RawFrame::Table {
            columns: vec![Field::Open, Field::Volume],
            bars: vec![],
        };
        assert_eq!(
            extract_close("S&P 500 (US)", Some(&frame)),
            ExtractOutcome::Skipped(SkipReason::MissingCloseColumn)
        );
    }

    #[test]
    fn extract_all_missing_close_values() {
        let frame = frame(&[(3, None), (4, Some(f64::NAN))]);
        assert_eq!(
            extract_close("S&P 500 (US)", Some(&frame)),
            ExtractOutcome::Skipped(SkipReason::NoCloseValues)
        );
    }

    #[test]
    fn extract_drops_missing_values() {
        let frame = frame(&[(3, Some(1.0)), (4, None), (5, Some(2.0))]);
        match extract_close("S&P 500 (US)", Some(&frame)) {
            ExtractOutcome::Included(s) => {
                assert_eq!(s.points.len(), 2);
                assert!(!s.points.contains_key(&day(4)));
            }
            other => panic!("expected included series, got {other:?}"),
        }
    }

    #[test]
    fn build_skips_and_reports_each_failure() {
        let raw = RawSeries::new()
            .with_frame("^GSPC", frame(&[(3, Some(4700.0)), (4, Some(4790.0))]))
            .with_frame("^IXIC", RawFrame::Malformed { reason: "bad".into() });
        let names = vec![
            "S&P 500 (US)".to_string(),
            "NASDAQ Composite (US)".to_string(),
            "DAX (Germany)".to_string(),
            "Atlantis 100".to_string(),
        ];

        let build = build_price_table(&IndexRegistry::new(), &names, &raw);

        assert_eq!(build.table.names(), vec!["S&P 500 (US)"]);
        let reasons: Vec<_> = build.skipped.iter().map(|s| s.reason.clone()).collect();
        assert_eq!(
            reasons,
            vec![
                SkipReason::Malformed { reason: "bad".into() },
                SkipReason::Absent,
                SkipReason::UnknownIndex,
            ]
        );
    }

    #[test]
    fn skipped_index_warning_names_index_and_cause() {
        let skipped = SkippedIndex {
            display_name: "DAX (Germany)".into(),
            reason: SkipReason::Absent,
        };
        assert_eq!(
            skipped.to_string(),
            "Failed to load: DAX (Germany) (no data returned by provider)"
        );
    }
}
