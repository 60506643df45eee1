//! Web server adapter.
//!
//! Serves the dashboard at `GET /`. Each request re-runs the whole pipeline;
//! the fetcher (and its cache) is shared behind a mutex and driven from a
//! blocking task.

mod error;
mod handlers;

pub use error::WebError;
pub use handlers::{dashboard, not_found, DashboardQuery};

use axum::{Router, routing::get};
use chrono::NaiveDate;
use std::sync::{Arc, Mutex};

use crate::domain::fetcher::Fetcher;
use crate::domain::registry::IndexRegistry;
use crate::ports::market_data_port::MarketDataPort;

pub type SharedFetcher = Mutex<Fetcher<Box<dyn MarketDataPort + Send>>>;

/// Selection used when a request does not name one.
#[derive(Debug, Clone)]
pub struct SelectionDefaults {
    pub start_date: NaiveDate,
    /// `None` means "today" at request time.
    pub end_date: Option<NaiveDate>,
    pub indices: Vec<String>,
}

pub struct AppState {
    pub registry: IndexRegistry,
    pub fetcher: SharedFetcher,
    pub defaults: SelectionDefaults,
}

impl AppState {
    pub fn new(
        registry: IndexRegistry,
        fetcher: Fetcher<Box<dyn MarketDataPort + Send>>,
        defaults: SelectionDefaults,
    ) -> Self {
        Self {
            registry,
            fetcher: Mutex::new(fetcher),
            defaults,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::dashboard))
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}
