//! Error types and error handling for the application
//!
//! This module defines the application error taxonomy and its conversion
//! to HTTP responses. All errors implement `IntoResponse` so handlers can
//! bubble them with `?`; every error reaching the transport boundary maps
//! to exactly one status code and one user-safe message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domain::DomainError;

/// Application-level error types
///
/// Domain validation failures are wrapped and reported with their own
/// message; persistence failures are classified once at the repository
/// boundary and pass through the service layer unchanged.
#[derive(Error, Debug)]
pub enum AppError {
    /// Path or query id is not a well-formed UUID
    #[error("invalid id format")]
    InvalidId,

    /// No subscription matches the requested id
    #[error("subscription not found")]
    NotFound,

    /// Rejected input: id mismatch on update, or a persistence constraint
    /// violation folded in at the repository boundary
    #[error("invalid input data")]
    InvalidData,

    /// Domain validation failure, reported with the underlying message
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Timeout, cancellation, or another driver-level database failure
    #[error("database error")]
    Database,

    /// Insert failed for a reason the driver did not classify
    #[error("failed to create subscription")]
    CreateFailed,

    /// List query failed for a reason the driver did not classify
    #[error("failed to list subscriptions")]
    ListFailed,

    /// Update failed for a reason the driver did not classify
    #[error("failed to update subscription")]
    UpdateFailed,

    /// Delete failed for a reason the driver did not classify
    #[error("failed to delete subscription")]
    DeleteFailed,

    /// Internal server error (catch-all for unexpected errors)
    ///
    /// The wrapped error is logged but never serialized into the response.
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::InvalidId | AppError::InvalidData | AppError::Domain(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Database
            | AppError::CreateFailed
            | AppError::ListFailed
            | AppError::UpdateFailed
            | AppError::DeleteFailed
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
