//! Error types for the circulation server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error codes exposed on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchUser = 4,
    NoSuchBook = 5,
    BorrowLimitExceeded = 6,
    InvalidDueDate = 7,
    DueDateTooFar = 8,
    NotCurrentlyBorrowed = 9,
    BadValue = 10,
}

/// A borrowing business rule the caller violated.
///
/// These are rejected requests, never retried internally and never fatal
/// to the process. A single borrow attempt can violate several rules at
/// once, so they travel as a list inside [`AppError::BorrowRejected`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BorrowViolation {
    #[error("you can only borrow up to {0} books at a time, please return a book to borrow a new one")]
    BorrowLimitExceeded(i16),

    #[error("the expected return date must be after today")]
    InvalidDueDate,

    #[error("the return date cannot exceed {0} days from today")]
    DueDateTooFar(i16),

    #[error("this book is not currently borrowed by the user")]
    NotCurrentlyBorrowed,
}

impl BorrowViolation {
    fn code(&self) -> ErrorCode {
        match self {
            BorrowViolation::BorrowLimitExceeded(_) => ErrorCode::BorrowLimitExceeded,
            BorrowViolation::InvalidDueDate => ErrorCode::InvalidDueDate,
            BorrowViolation::DueDateTooFar(_) => ErrorCode::DueDateTooFar,
            BorrowViolation::NotCurrentlyBorrowed => ErrorCode::NotCurrentlyBorrowed,
        }
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Borrow rejected: {}", format_violations(.0))]
    BorrowRejected(Vec<BorrowViolation>),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a single violated rule.
    pub fn rule(violation: BorrowViolation) -> Self {
        AppError::BorrowRejected(vec![violation])
    }
}

fn format_violations(violations: &[BorrowViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    /// Every violated borrowing rule, present only on rejected borrows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, violations) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone(), None)
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchBook, msg.clone(), None)
            }
            AppError::BorrowRejected(rules) => {
                let code = rules.first().map(BorrowViolation::code).unwrap_or(ErrorCode::BadValue);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    code,
                    format_violations(rules),
                    Some(rules.iter().map(|v| v.to_string()).collect()),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone(), None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            violations,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_borrow_lists_every_violation() {
        let err = AppError::BorrowRejected(vec![
            BorrowViolation::InvalidDueDate,
            BorrowViolation::BorrowLimitExceeded(3),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("after today"));
        assert!(msg.contains("up to 3 books"));
    }

    #[test]
    fn violation_codes_are_distinct() {
        let codes = [
            BorrowViolation::BorrowLimitExceeded(3).code(),
            BorrowViolation::InvalidDueDate.code(),
            BorrowViolation::DueDateTooFar(30).code(),
            BorrowViolation::NotCurrentlyBorrowed.code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in codes.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
