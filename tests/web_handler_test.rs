#![cfg(feature = "web")]
//! Web handler integration tests.
//!
//! Tests cover:
//! - Dashboard page renders the form, charts and pair lines
//! - Query parameters drive the selection
//! - Repeated requests share the fetch cache
//! - Empty selection and bad input responses

mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use indexboard::adapters::web::{AppState, SelectionDefaults, build_router};
use indexboard::domain::fetch_cache::FetchCache;
use indexboard::domain::fetcher::Fetcher;
use indexboard::domain::registry::IndexRegistry;
use indexboard::ports::market_data_port::MarketDataPort;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;

use common::*;

fn create_test_app() -> (Router, Arc<AtomicUsize>) {
    let port = MockMarketDataPort::new()
        .with_frame("^GSPC", weekday_closes("2022-01-03", 6, 4796.0, -20.0))
        .with_frame("^IXIC", weekday_closes("2022-01-03", 6, 15832.0, -150.0))
        .with_frame("^GDAXI", weekday_closes("2022-01-03", 6, 16020.0, 35.0));
    let calls = port.call_counter();

    let boxed: Box<dyn MarketDataPort + Send> = Box::new(port);
    let state = AppState::new(
        IndexRegistry::new(),
        Fetcher::new(boxed, FetchCache::default()),
        SelectionDefaults {
            start_date: date("2022-01-01"),
            end_date: Some(date("2022-01-10")),
            indices: names(&["S&P 500 (US)", "NASDAQ Composite (US)"]),
        },
    );
    (build_router(state), calls)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn default_dashboard_renders() {
    let (app, _) = create_test_app();
    let (status, body) = get(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<form"));
    assert!(body.contains("class=\"line-chart\""));
    assert!(body.contains("class=\"heatmap\""));
    assert!(body.contains("Strongest correlation: S&amp;P 500 (US) ↔ NASDAQ Composite (US)"));
}

#[tokio::test]
async fn query_selects_indices() {
    let (app, _) = create_test_app();
    let (status, body) = get(
        &app,
        "/?start=2022-01-01&end=2022-01-10&index=DAX+%28Germany%29&index=S%26P+500+%28US%29",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("DAX (Germany) ↔ S&amp;P 500 (US)"));
    assert!(body.contains("value=\"DAX (Germany)\" checked"));
}

#[tokio::test]
async fn repeated_requests_share_the_cache() {
    let (app, calls) = create_test_app();
    get(&app, "/").await;
    get(&app, "/").await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    get(&app, "/?indices=DAX+%28Germany%29").await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unknown_index_is_a_warning() {
    let (app, _) = create_test_app();
    let (status, body) = get(&app, "/?indices=S%26P+500+%28US%29%2C+Atlantis+100").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Failed to load: Atlantis 100 (not in the index catalog)"));
}

#[tokio::test]
async fn empty_selection_shows_error_message() {
    let (app, calls) = create_test_app();
    let (status, body) = get(&app, "/?indices=").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No valid data to display."));
    assert!(!body.contains("<svg"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn form_always_sends_an_explicit_index_list() {
    let (app, _) = create_test_app();
    let (_, body) = get(&app, "/").await;
    assert!(body.contains("<input type=\"hidden\" name=\"indices\" value=\"\">"));
}

#[tokio::test]
async fn form_with_every_box_unchecked_is_an_empty_selection() {
    let (app, calls) = create_test_app();
    // what the browser sends for the form with no checkbox ticked
    let (status, body) = get(&app, "/?indices=&start=2022-01-01&end=2022-01-10").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No valid data to display."));
    assert!(!body.contains("Strongest correlation"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn form_with_one_box_checked_selects_only_that_index() {
    let (app, _) = create_test_app();
    let (status, body) = get(
        &app,
        "/?indices=&start=2022-01-01&end=2022-01-10&index=DAX+%28Germany%29",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("value=\"DAX (Germany)\" checked"));
    assert!(!body.contains("value=\"S&amp;P 500 (US)\" checked"));
    assert!(body.contains("Not enough indices to compare."));
}

#[tokio::test]
async fn inverted_dates_are_bad_request() {
    let (app, _) = create_test_app();
    let (status, body) = get(&app, "/?start=2022-02-01&end=2022-01-01").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("invalid date range"));
}

#[tokio::test]
async fn malformed_date_is_bad_request() {
    let (app, _) = create_test_app();
    let (status, _) = get(&app, "/?start=yesterday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let (app, _) = create_test_app();
    let (status, body) = get(&app, "/report/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Page not found"));
}
