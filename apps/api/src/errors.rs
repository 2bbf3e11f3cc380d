use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::error::ErrorKind;
use thiserror::Error;

use crate::dropdowns::DropdownError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Dropdown(#[from] DropdownError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Maps constraint violations on writes to client errors; anything else
    /// stays a database error.
    pub fn from_write(e: sqlx::Error, what: &str) -> Self {
        match e.as_database_error().map(|db| db.kind()) {
            Some(ErrorKind::UniqueViolation) => AppError::Conflict(format!("{what} already exists")),
            Some(ErrorKind::ForeignKeyViolation) => {
                AppError::UnprocessableEntity(format!("{what} references a missing or protected row"))
            }
            Some(ErrorKind::CheckViolation) => {
                AppError::UnprocessableEntity(format!("{what} breaks a data constraint"))
            }
            _ => AppError::Database(e),
        }
    }
}

/// Client-facing status for a constraint violated while replacing lookup
/// rows. Lookup tables name their tenant FK `<table>_company_id_fkey`; every
/// other FK hit during a replace is an application still holding a row.
fn lookup_constraint(
    kind: ErrorKind,
    constraint: Option<&str>,
) -> Option<(StatusCode, &'static str, &'static str)> {
    match kind {
        ErrorKind::ForeignKeyViolation
            if constraint.is_some_and(|c| c.ends_with("_company_id_fkey")) =>
        {
            Some((
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNKNOWN_COMPANY",
                "The company owning these rows does not exist",
            ))
        }
        ErrorKind::ForeignKeyViolation => Some((
            StatusCode::CONFLICT,
            "LOOKUP_IN_USE",
            "A row being removed is still referenced by an application",
        )),
        ErrorKind::UniqueViolation => Some((
            StatusCode::CONFLICT,
            "CONFLICT",
            "A row with this code already exists in the scope",
        )),
        _ => None,
    }
}

fn storage_failure(e: &sqlx::Error) -> (StatusCode, &'static str, String) {
    let classified = e
        .as_database_error()
        .and_then(|db| lookup_constraint(db.kind(), db.constraint()));
    match classified {
        Some((status, code, message)) => {
            tracing::warn!("Lookup replace refused: {e}");
            (status, code, message.to_string())
        }
        None => database_failure(e),
    }
}

fn database_failure(e: &sqlx::Error) -> (StatusCode, &'static str, String) {
    tracing::error!("Database error: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "DATABASE_ERROR",
        "A database error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Dropdown(e) => match e {
                DropdownError::UnknownTable(_) => {
                    (StatusCode::NOT_FOUND, "UNKNOWN_TABLE", e.to_string())
                }
                DropdownError::MissingColumnMapping(_) => {
                    tracing::error!("Configuration error: {e}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "MISSING_COLUMN_MAPPING",
                        e.to_string(),
                    )
                }
                DropdownError::InvalidTenantId(_)
                | DropdownError::MixedTenantBatch { .. }
                | DropdownError::TenantScopeMismatch { .. }
                | DropdownError::RecordShapeMismatch(_) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
                }
                DropdownError::Import(_) => {
                    (StatusCode::BAD_REQUEST, "IMPORT_ERROR", e.to_string())
                }
                DropdownError::Storage(inner) => storage_failure(inner),
            },
            AppError::Database(e) => database_failure(e),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
