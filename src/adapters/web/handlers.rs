//! HTTP request handlers for web adapter.

use axum::{
    extract::{Query, State},
    response::Html,
};
use chrono::{Local, NaiveDate};
use std::sync::Arc;

use crate::adapters::html_dashboard::DashboardPage;
use crate::domain::config_validation::parse_date;
use crate::domain::dashboard::build_dashboard;
use crate::domain::selection::{Selection, parse_index_list};

use super::{AppState, SelectionDefaults, WebError};

/// Dashboard inputs taken from the query string.
///
/// `indices` is a comma-separated list and `index` may repeat (one per
/// checked box); both add to the selection. The form always sends an empty
/// `indices`, so a submit with no box checked is an empty selection. When
/// neither key is present the default selection applies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub indices: Option<Vec<String>>,
}

impl DashboardQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, WebError> {
        let mut query = DashboardQuery::default();
        for (key, value) in pairs {
            match key.as_str() {
                "start" if !value.is_empty() => {
                    query.start = Some(parse_date(value, "query", "start")?);
                }
                "end" if !value.is_empty() => {
                    query.end = Some(parse_date(value, "query", "end")?);
                }
                "indices" => {
                    let names = parse_index_list(value)
                        .map_err(|e| WebError::bad_request(format!("indices: {}", e)))?;
                    query.indices.get_or_insert_with(Vec::new).extend(names);
                }
                "index" => {
                    let name = value.trim();
                    if !name.is_empty() {
                        query
                            .indices
                            .get_or_insert_with(Vec::new)
                            .push(name.to_string());
                    }
                }
                _ => {}
            }
        }
        Ok(query)
    }

    pub fn into_selection(
        self,
        defaults: &SelectionDefaults,
        today: NaiveDate,
    ) -> Result<Selection, WebError> {
        let start = self.start.unwrap_or(defaults.start_date);
        let end = self.end.or(defaults.end_date).unwrap_or(today);
        let indices = self.indices.unwrap_or_else(|| defaults.indices.clone());
        Ok(Selection::new(indices, start, end)?)
    }
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Html<String>, WebError> {
    let selection =
        DashboardQuery::from_pairs(&pairs)?.into_selection(&state.defaults, Local::now().date_naive())?;

    let html = tokio::task::spawn_blocking(move || render_dashboard(&state, &selection))
        .await
        .map_err(|e| WebError::internal(format!("dashboard task failed: {}", e)))??;
    Ok(Html(html))
}

fn render_dashboard(state: &AppState, selection: &Selection) -> Result<String, WebError> {
    let outcome = {
        let mut fetcher = state
            .fetcher
            .lock()
            .map_err(|_| WebError::internal("fetcher lock poisoned"))?;
        build_dashboard(&state.registry, &mut *fetcher, selection)
    };
    Ok(DashboardPage::from_outcome(&outcome)
        .with_form(&state.registry)
        .to_html()?)
}

pub async fn not_found() -> WebError {
    WebError::not_found("Page not found")
}
