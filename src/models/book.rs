//! Book model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Book reference data.
///
/// Catalog management (authors, branches, stock) belongs to the catalog
/// service; borrows only need the identity and display fields. Titles are
/// not tracked per physical copy, so several users can hold concurrent
/// borrows of the same book.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub isbn: String,
    pub title: String,
    pub category: Option<String>,
}
