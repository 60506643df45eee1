//! HTTP error responses for web adapter.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::domain::error::IndexboardError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &IndexboardError) -> StatusCode {
    match err {
        IndexboardError::InvalidDateRange { .. }
        | IndexboardError::UnknownIndex { .. }
        | IndexboardError::ConfigMissing { .. }
        | IndexboardError::ConfigInvalid { .. }
        | IndexboardError::ConfigParse { .. } => StatusCode::BAD_REQUEST,
        IndexboardError::NoValidData => StatusCode::UNPROCESSABLE_ENTITY,
        IndexboardError::Provider { .. } => StatusCode::BAD_GATEWAY,
        IndexboardError::Render { .. } | IndexboardError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<IndexboardError> for WebError {
    fn from(err: IndexboardError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorPage<'a> {
    status: u16,
    message: &'a str,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let page = ErrorPage {
            status: self.status.as_u16(),
            message: &self.message,
        };
        match page.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, self.message).into_response(),
        }
    }
}
