//! Field validation helpers.
//!
//! Each payload is checked field by field in declaration order and the first
//! violated rule becomes the `400` message.

use axum::extract::rejection::JsonRejection;
use regex::Regex;
use url::Url;

use crate::api::error::ApiError;

pub(crate) const REQUIRED: &str = "Required";
pub(crate) const INVALID_BODY: &str = "Invalid request body";

pub(crate) fn fail<T>(message: impl Into<String>) -> Result<T, ApiError> {
    Err(ApiError::Validation(message.into()))
}

/// Unwraps a JSON body, mapping rejections (bad JSON, wrong types) to `400`.
pub(crate) fn body<T>(payload: Result<axum::Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(axum::Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!("Rejected request body: {rejection}");
            fail(INVALID_BODY)
        }
    }
}

pub(crate) fn required<T>(value: Option<T>) -> Result<T, ApiError> {
    value.map_or_else(|| fail(REQUIRED), Ok)
}

/// Checks `min..=max` measured in characters.
pub(crate) fn length(
    value: &str,
    min: usize,
    max: usize,
    too_short: &str,
    too_long: &str,
) -> Result<(), ApiError> {
    let len = value.chars().count();
    if len < min {
        return fail(too_short);
    }
    if len > max {
        return fail(too_long);
    }
    Ok(())
}

pub(crate) fn is_slug(value: &str) -> bool {
    Regex::new(r"^[a-z0-9-]+$").is_ok_and(|re| re.is_match(value))
}

pub(crate) fn is_email(value: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(value))
}

pub(crate) fn is_username(value: &str) -> bool {
    Regex::new(r"^[a-zA-Z0-9_]+$").is_ok_and(|re| re.is_match(value))
}

pub(crate) fn is_url(value: &str) -> bool {
    Url::parse(value).is_ok()
}

/// Validates a slug for the given entity label ("Game", "Category").
pub(crate) fn slug(value: &str, label: &str) -> Result<(), ApiError> {
    length(
        value,
        1,
        100,
        &format!("{label} slug is required"),
        &format!("{label} slug must be less than 100 characters"),
    )?;
    if !is_slug(value) {
        return fail(format!(
            "{label} slug can only contain lowercase letters, numbers, and hyphens"
        ));
    }
    Ok(())
}

/// Validates a display name for the given entity label.
pub(crate) fn name(value: &str, label: &str) -> Result<(), ApiError> {
    length(
        value,
        1,
        100,
        &format!("{label} name is required"),
        &format!("{label} name must be less than 100 characters"),
    )
}

pub(crate) fn min_number(value: f64, min: f64) -> Result<(), ApiError> {
    if value < min {
        return fail(format!("Number must be greater than or equal to {min}"));
    }
    Ok(())
}

pub(crate) fn max_number(value: f64, max: f64) -> Result<(), ApiError> {
    if value > max {
        return fail(format!("Number must be less than or equal to {max}"));
    }
    Ok(())
}

/// Prices are stored as `NUMERIC(10,2)`; anything finer than a cent would be
/// rounded by Postgres and drift from what the seller submitted.
pub(crate) fn cents(value: f64) -> Result<(), ApiError> {
    let scaled = value * 100.0;
    if (scaled - scaled.round()).abs() > 1e-6 {
        return fail("Price can have at most 2 decimal places");
    }
    Ok(())
}

/// Accepts a non-negative JSON number without a fractional part.
pub(crate) fn non_negative_int(value: f64) -> Result<i32, ApiError> {
    if value.fract() != 0.0 {
        return fail("Expected integer, received float");
    }
    min_number(value, 0.0)?;
    if value > f64::from(i32::MAX) {
        return fail(format!("Number must be less than or equal to {}", i32::MAX));
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(value as i32)
}

/// Parses an enum value, reporting the accepted options on failure.
pub(crate) fn one_of<T>(
    value: &str,
    options: &[&str],
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, ApiError> {
    parse(value).map_or_else(
        || {
            let expected = options
                .iter()
                .map(|option| format!("'{option}'"))
                .collect::<Vec<_>>()
                .join(" | ");
            fail(format!(
                "Invalid enum value. Expected {expected}, received '{value}'"
            ))
        },
        Ok,
    )
}
