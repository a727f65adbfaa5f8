//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs and helpers that map
//! body and query rejections onto [`AppError`].

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;
use regdesk_core::ValidationError;

use crate::error::AppError;

/// Request types that carry business rules beyond what serde checks.
pub trait Validate {
    /// Check the rules. The error keeps its kind so a refused last-tag
    /// delete still maps to 409.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
///
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<..., AppError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate()?;
    Ok(value)
}

/// Extract query parameters, mapping parse errors to [`AppError::BadRequest`].
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

impl Validate for regdesk_core::NewCompany {
    fn validate(&self) -> Result<(), ValidationError> {
        regdesk_core::NewCompany::validate(self)
    }
}

impl Validate for regdesk_core::CompanyPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        regdesk_core::CompanyPatch::validate(self)
    }
}

impl Validate for regdesk_core::TagPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        regdesk_core::TagPatch::validate(self)
    }
}

impl Validate for regdesk_core::LawPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        regdesk_core::LawPatch::validate(self)
    }
}

impl Validate for regdesk_core::ControlFrameworkPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        regdesk_core::ControlFrameworkPatch::validate(self)
    }
}
