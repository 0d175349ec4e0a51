//! Parsing of optional query-string filters.

use adoptme_common::{AppError, AppResult, FieldError};
use serde::de::DeserializeOwned;

/// Trimmed value, with blank treated as absent.
#[must_use]
pub fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse an enum filter by its wire name. Blank is absent, anything unknown is a validation error.
pub fn parse_enum<T: DeserializeOwned>(field: &str, raw: Option<&str>) -> AppResult<Option<T>> {
    let Some(value) = non_blank(raw) else {
        return Ok(None);
    };

    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map(Some)
        .map_err(|_| {
            AppError::Validation(vec![FieldError::new(
                field,
                format!("Invalid {field} '{value}'"),
            )])
        })
}

/// Parse an integer filter. Blank is absent.
pub fn parse_int(field: &str, raw: Option<&str>) -> AppResult<Option<i32>> {
    let Some(value) = non_blank(raw) else {
        return Ok(None);
    };

    value.parse().map(Some).map_err(|_| {
        AppError::Validation(vec![FieldError::new(field, format!("{field} must be an integer"))])
    })
}
