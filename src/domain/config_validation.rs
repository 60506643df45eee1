//! Configuration validation.
//!
//! Validates every config field before a pipeline run. Missing keys are fine
//! wherever a default exists; present keys must parse.

use crate::domain::error::IndexboardError;
use crate::domain::registry::IndexRegistry;
use crate::domain::selection::parse_index_list;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use tracing::warn;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const PROVIDER_KINDS: &[&str] = &["yahoo", "csv"];

pub fn validate_dashboard_config(
    config: &dyn ConfigPort,
    registry: &IndexRegistry,
) -> Result<(), IndexboardError> {
    validate_dates(config)?;
    validate_indices(config, registry)?;
    Ok(())
}

pub fn validate_provider_config(config: &dyn ConfigPort) -> Result<(), IndexboardError> {
    validate_provider_kind(config)?;
    validate_timeout(config)?;
    validate_cache_capacity(config)?;
    Ok(())
}

pub fn parse_date(value: &str, section: &str, field: &str) -> Result<NaiveDate, IndexboardError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        IndexboardError::ConfigInvalid {
            section: section.to_string(),
            key: field.to_string(),
            reason: format!("invalid {} format, expected YYYY-MM-DD", field),
        }
    })
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), IndexboardError> {
    let start = config
        .get_string("dashboard", "start_date")
        .map(|s| parse_date(&s, "dashboard", "start_date"))
        .transpose()?;
    let end = config
        .get_string("dashboard", "end_date")
        .map(|s| parse_date(&s, "dashboard", "end_date"))
        .transpose()?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(IndexboardError::ConfigInvalid {
                section: "dashboard".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must not be after end_date".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_indices(
    config: &dyn ConfigPort,
    registry: &IndexRegistry,
) -> Result<(), IndexboardError> {
    let Some(list) = config.get_string("dashboard", "indices") else {
        return Ok(());
    };

    let names = parse_index_list(&list).map_err(|e| IndexboardError::ConfigInvalid {
        section: "dashboard".to_string(),
        key: "indices".to_string(),
        reason: e.to_string(),
    })?;

    // unknown names are not fatal; the pipeline skips them
    for name in names.iter().filter(|n| !registry.contains(n)) {
        warn!(index = %name, "configured index is not in the catalog");
    }
    Ok(())
}

fn validate_provider_kind(config: &dyn ConfigPort) -> Result<(), IndexboardError> {
    let kind = config
        .get_string("provider", "kind")
        .unwrap_or_else(|| "yahoo".to_string());
    let kind = kind.trim().to_lowercase();

    if !PROVIDER_KINDS.contains(&kind.as_str()) {
        return Err(IndexboardError::ConfigInvalid {
            section: "provider".to_string(),
            key: "kind".to_string(),
            reason: format!("kind must be one of: {}", PROVIDER_KINDS.join(", ")),
        });
    }

    if kind == "csv" {
        match config.get_string("provider", "data_dir") {
            Some(dir) if !dir.trim().is_empty() => {}
            _ => {
                return Err(IndexboardError::ConfigMissing {
                    section: "provider".to_string(),
                    key: "data_dir".to_string(),
                });
            }
        }
    }
    Ok(())
}

fn validate_timeout(config: &dyn ConfigPort) -> Result<(), IndexboardError> {
    let value = parse_int(config, "provider", "timeout_secs")?;
    if value.is_some_and(|v| v <= 0) {
        return Err(IndexboardError::ConfigInvalid {
            section: "provider".to_string(),
            key: "timeout_secs".to_string(),
            reason: "timeout_secs must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_cache_capacity(config: &dyn ConfigPort) -> Result<(), IndexboardError> {
    let value = parse_int(config, "cache", "capacity")?;
    if value.is_some_and(|v| v < 1) {
        return Err(IndexboardError::ConfigInvalid {
            section: "cache".to_string(),
            key: "capacity".to_string(),
            reason: "capacity must be at least 1".to_string(),
        });
    }
    Ok(())
}

/// Present integer keys must parse; `get_int` alone would hide a typo behind
/// the default.
fn parse_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<i64>, IndexboardError> {
    config
        .get_string(section, key)
        .map(|raw| {
            raw.trim()
                .parse::<i64>()
                .map_err(|_| IndexboardError::ConfigInvalid {
                    section: section.to_string(),
                    key: key.to_string(),
                    reason: format!("{key} must be an integer, got {:?}", raw.trim()),
                })
        })
        .transpose()
}
