use axum::http::StatusCode;
use time::OffsetDateTime;

use crate::constants::*;
use crate::database::{Db, UserDatabases};
use crate::stats::{parse_date, parse_time};

pub type ApiError = (StatusCode, String);

pub async fn get_user_database(user_dbs: &UserDatabases, user_id: &str) -> Result<Db, ApiError> {
    user_dbs.get(user_id).await.map_err(|e| {
        tracing::error!(user_id, error = %e, "failed to open user database");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ERR_DATABASE_ACCESS.to_string(),
        )
    })
}

pub fn db_error() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ERR_DATABASE_OPERATION.to_string(),
    )
}

pub fn db_error_with_context(context: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Database error: {}", context),
    )
}

/// Logs the underlying libsql error and returns the generic rejection.
pub fn log_db_error(context: &'static str) -> impl FnOnce(libsql::Error) -> ApiError {
    move |e| {
        tracing::error!(error = %e, "database error: {}", context);
        db_error_with_context(context)
    }
}

pub fn not_found(what: &str) -> ApiError {
    (StatusCode::NOT_FOUND, format!("{} not found", what))
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, message.into())
}

pub fn validate_string_length(
    value: &str,
    field_name: &str,
    max_length: usize,
) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(bad_request(format!("{} cannot be empty", field_name)));
    }
    if value.chars().count() > max_length {
        return Err(bad_request(format!(
            "{} must be less than {} characters",
            field_name, max_length
        )));
    }
    Ok(())
}

pub fn validate_amount(value: f64, field_name: &str, min: f64) -> Result<(), ApiError> {
    if !value.is_finite() {
        return Err(bad_request(format!("{} must be a valid number", field_name)));
    }
    if value < min {
        return Err(bad_request(format!(
            "{} must be at least {}",
            field_name, min
        )));
    }
    Ok(())
}

pub fn validate_date(value: &str) -> Result<(), ApiError> {
    parse_date(value)
        .map(|_| ())
        .ok_or_else(|| bad_request("Date must be in YYYY-MM-DD format"))
}

pub fn validate_time(value: &str) -> Result<(), ApiError> {
    parse_time(value)
        .map(|_| ())
        .ok_or_else(|| bad_request("Time must be in HH:MM format"))
}

pub fn validate_note(value: &str) -> Result<(), ApiError> {
    if value.chars().count() > MAX_NOTE_LENGTH {
        return Err(bad_request(format!(
            "Note must be less than {} characters",
            MAX_NOTE_LENGTH
        )));
    }
    Ok(())
}

/// Blank optional strings are stored as NULL.
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn now_timestamp() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
