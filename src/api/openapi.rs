//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{borrows, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Circulation API",
        version = "0.3.0",
        description = "Library circulation REST API - borrowing, returns, penalties and reminders",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Borrows
        borrows::borrow_book,
        borrows::return_book,
        borrows::list_borrows,
        borrows::list_overdue,
    ),
    components(
        schemas(
            // Borrows
            borrows::BorrowRequest,
            borrows::BorrowResponse,
            borrows::ReturnRequest,
            borrows::ReturnResponse,
            crate::models::borrow::Borrow,
            crate::models::borrow::BorrowDetails,
            crate::models::borrow::OverdueBorrow,
            crate::models::borrow::ReturnOutcome,
            crate::models::book::Book,
            crate::models::user::User,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "borrows", description = "Borrow and return management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
