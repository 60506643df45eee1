//! Core domain types and logic.

pub mod config_validation;
pub mod correlation;
pub mod dashboard;
pub mod error;
pub mod fetch_cache;
pub mod fetcher;
pub mod normalize;
pub mod ohlcv;
pub mod price_table;
pub mod registry;
pub mod selection;
