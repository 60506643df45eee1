//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for indexboard.
#[derive(Debug, thiserror::Error)]
pub enum IndexboardError {
    #[error("unknown index: {name}")]
    UnknownIndex { name: String },

    #[error("No valid data to display.")]
    NoValidData,

    #[error("market data provider error: {reason}")]
    Provider { reason: String },

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("render error: {reason}")]
    Render { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&IndexboardError> for std::process::ExitCode {
    fn from(err: &IndexboardError) -> Self {
        let code: u8 = match err {
            IndexboardError::Io(_) | IndexboardError::Render { .. } => 1,
            IndexboardError::ConfigParse { .. }
            | IndexboardError::ConfigMissing { .. }
            | IndexboardError::ConfigInvalid { .. }
            | IndexboardError::InvalidDateRange { .. } => 2,
            IndexboardError::Provider { .. } => 3,
            IndexboardError::UnknownIndex { .. } => 4,
            IndexboardError::NoValidData => 5,
        };
        std::process::ExitCode::from(code)
    }
}
