//! Borrow and return endpoints

use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::borrow::{BorrowDetails, OverdueBorrow},
};

use super::AuthenticatedUser;

/// Borrow request
#[derive(Deserialize, ToSchema)]
pub struct BorrowRequest {
    /// Book ID
    pub book_id: i32,
    /// Agreed due date (calendar date, no time-of-day)
    pub expected_return_date: NaiveDate,
}

/// Borrow response
#[derive(Serialize, ToSchema)]
pub struct BorrowResponse {
    /// Borrow ID
    pub borrow_id: i32,
    /// Agreed due date
    pub expected_return_date: NaiveDate,
    /// Status message
    pub message: String,
}

/// Return request
#[derive(Deserialize, ToSchema)]
pub struct ReturnRequest {
    /// Book ID
    pub book_id: i32,
}

/// Return response
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Status message, naming the penalty when the return was late
    pub message: String,
    /// Whole days past the due date
    pub days_late: i64,
    /// Penalty charged, present only on a late return
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub penalty: Option<Decimal>,
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Book borrowed", body = BorrowResponse),
        (status = 404, description = "User or book not found"),
        (status = 422, description = "Borrow limit reached or due date out of range")
    )
)]
pub async fn borrow_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BorrowRequest>,
) -> AppResult<(StatusCode, Json<BorrowResponse>)> {
    let borrow = state
        .services
        .borrows
        .borrow(claims.user_id, request.book_id, request.expected_return_date)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BorrowResponse {
            borrow_id: borrow.id,
            expected_return_date: borrow.expected_return_date,
            message: "Book borrowed successfully".to_string(),
        }),
    ))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/returns",
    tag = "borrows",
    security(("bearer_auth" = [])),
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 404, description = "User or book not found"),
        (status = 422, description = "Book is not currently borrowed by the user")
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ReturnRequest>,
) -> AppResult<Json<ReturnResponse>> {
    let outcome = state
        .services
        .borrows
        .return_book(claims.user_id, request.book_id)
        .await?;

    let response = if outcome.is_late() {
        ReturnResponse {
            message: format!(
                "Book returned successfully. Late by {} days. Penalty incurred: ${}.",
                outcome.days_late, outcome.penalty
            ),
            days_late: outcome.days_late,
            penalty: Some(outcome.penalty),
        }
    } else {
        ReturnResponse {
            message: "Book returned successfully".to_string(),
            days_late: 0,
            penalty: None,
        }
    };

    Ok(Json(response))
}

/// The caller's outstanding borrows
#[utoipa::path(
    get,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Outstanding borrows", body = Vec<BorrowDetails>),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowDetails>>> {
    let borrows = state
        .services
        .borrows
        .outstanding_for_user(claims.user_id)
        .await?;
    Ok(Json(borrows))
}

/// The caller's overdue borrows, with accrued days
#[utoipa::path(
    get,
    path = "/borrows/overdue",
    tag = "borrows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Overdue borrows, empty when none", body = Vec<OverdueBorrow>),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_overdue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<OverdueBorrow>>> {
    let overdue = state.services.borrows.list_overdue(claims.user_id).await?;
    Ok(Json(overdue))
}
