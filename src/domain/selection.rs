//! User selection: a date range plus an ordered list of catalog display names.

use crate::domain::error::IndexboardError;
use crate::domain::registry::IndexRegistry;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub display_names: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Selection {
    /// Builds a selection, dropping duplicate names while keeping first-seen order.
    pub fn new(
        display_names: Vec<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, IndexboardError> {
        if start_date > end_date {
            return Err(IndexboardError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }

        let mut seen = HashSet::new();
        let display_names = display_names
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .collect();

        Ok(Self {
            display_names,
            start_date,
            end_date,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.display_names.is_empty()
    }

    /// Provider symbols for every name the registry knows. Unknown names are
    /// left out here and reported by the price table builder.
    pub fn tickers(&self, registry: &IndexRegistry) -> BTreeSet<String> {
        self.display_names
            .iter()
            .filter_map(|name| registry.lookup_symbol(name).ok())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("empty entry in index list")]
    EmptyToken,

    #[error("duplicate index: {0}")]
    DuplicateIndex(String),
}

/// Parses a comma separated list of display names as written in config files.
/// An empty or whitespace-only input is an empty selection.
pub fn parse_index_list(input: &str) -> Result<Vec<String>, SelectionError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(SelectionError::EmptyToken);
        }
        if !seen.insert(trimmed.to_string()) {
            return Err(SelectionError::DuplicateIndex(trimmed.to_string()));
        }
        names.push(trimmed.to_string());
    }

    Ok(names)
}
