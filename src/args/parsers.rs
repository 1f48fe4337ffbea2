use std::time::Duration;

use serde_json::Value;

use super::types::PositiveUsize;
use crate::error::{AppError, AppResult, ValidationError};

pub(crate) fn parse_header(s: &str) -> Result<(String, String), ValidationError> {
    match s.split_once(':') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.trim().to_owned()))
        }
        Some(_) | None => Err(ValidationError::InvalidHeaderFormat {
            value: s.to_owned(),
        }),
    }
}

pub(super) fn parse_positive_usize(s: &str) -> AppResult<PositiveUsize> {
    s.parse::<PositiveUsize>().map_err(AppError::from)
}

pub(super) fn parse_duration_arg(s: &str) -> AppResult<Duration> {
    crate::config::parse_duration_value(s).map_err(AppError::from)
}

/// Parses a `--data` payload as JSON. Quote plain text to send it as a JSON
/// string.
pub(super) fn parse_json_payload(s: &str) -> AppResult<Value> {
    serde_json::from_str(s)
        .map_err(|err| AppError::validation(ValidationError::InvalidPayload { source: err }))
}
