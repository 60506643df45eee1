//! Performance normalizer: rescales each column to a base of 100 at the first row.
//!
//! A column whose first value is zero or not finite cannot be rebased. It is left
//! out of the normalized table and reported in [`Normalized::skipped`]; the
//! price table and the correlation analysis keep it.

use crate::domain::price_table::{Column, NormalizedTable, PriceTable};
use std::fmt;
use tracing::warn;

pub const BASE_VALUE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeSkip {
    pub display_name: String,
    pub first_value: f64,
}

impl fmt::Display for NormalizeSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot normalize {}: first value {} is not a usable base",
            self.display_name, self.first_value
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub table: NormalizedTable,
    pub skipped: Vec<NormalizeSkip>,
}

pub fn normalize(table: &PriceTable) -> Normalized {
    let mut columns = Vec::with_capacity(table.column_count());
    let mut skipped = Vec::new();

    for column in table.columns() {
        let Some(&first) = column.values.first() else {
            continue;
        };
        if !first.is_finite() || first.abs() < f64::EPSILON {
            warn!(index = %column.name, first, "skipping normalization");
            skipped.push(NormalizeSkip {
                display_name: column.name.clone(),
                first_value: first,
            });
            continue;
        }

        let values = column
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| if i == 0 { BASE_VALUE } else { v / first * BASE_VALUE })
            .collect();
        columns.push(Column {
            name: column.name.clone(),
            values,
        });
    }

    Normalized {
        table: NormalizedTable::new(table.dates().to_vec(), columns),
        skipped,
    }
}
