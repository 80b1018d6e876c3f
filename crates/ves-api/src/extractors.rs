//! # Request Validation Boundary
//!
//! Request DTOs implement [`Validate`] for the business rules serde
//! cannot express (hash formats, non-empty titles). Handlers take
//! `Result<Json<T>, JsonRejection>` and pass it through
//! [`extract_validated_json`]; malformed JSON and rule violations both
//! come back as [`AppError::Validation`], so nothing invalid gets past
//! the boundary.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Business-rule validation beyond what deserialization checks.
pub trait Validate {
    /// Returns the offending rule as an error message.
    fn validate(&self) -> Result<(), String>;
}

/// Unwrap a JSON extraction, then run the DTO's business rules.
pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(value) = body.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}
