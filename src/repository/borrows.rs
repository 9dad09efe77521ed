//! Borrow ledger repository for database operations

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult, BorrowViolation},
    models::borrow::{Borrow, NewBorrow},
};

/// The borrow ledger: every loan ever created, open ones having no
/// return date. Injected into the borrow service at construction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BorrowLedger: Send + Sync {
    /// Number of outstanding borrows held by a user.
    async fn count_outstanding(&self, user_id: i32) -> AppResult<i64>;

    /// The outstanding borrow of `book_id` by `user_id`, if any.
    async fn find_outstanding(&self, user_id: i32, book_id: i32) -> AppResult<Option<Borrow>>;

    /// All outstanding borrows of a user, oldest due date first.
    async fn outstanding_for_user(&self, user_id: i32) -> AppResult<Vec<Borrow>>;

    /// Insert a new borrow record, re-checking the user's borrow cap
    /// inside the same transaction. Fails with `BorrowLimitExceeded`
    /// when the cap is already reached, leaving no partial state.
    async fn insert(&self, new: &NewBorrow, max_borrows: i16) -> AppResult<Borrow>;

    /// Close a borrow by setting its return date, only if it is still
    /// open. Returns `None` when the record was already closed, so a
    /// second concurrent return cannot double-close.
    async fn close(&self, borrow_id: i32, returned_on: NaiveDate) -> AppResult<Option<Borrow>>;

    /// Fetch a borrow by id. `None` is an expected outcome for the
    /// reminder handler, not an error.
    async fn get(&self, borrow_id: i32) -> AppResult<Option<Borrow>>;
}

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BorrowLedger for BorrowsRepository {
    async fn count_outstanding(&self, user_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrows WHERE user_id = $1 AND return_date IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn find_outstanding(&self, user_id: i32, book_id: i32) -> AppResult<Option<Borrow>> {
        let borrow = sqlx::query_as::<_, Borrow>(
            r#"
            SELECT * FROM borrows
            WHERE user_id = $1 AND book_id = $2 AND return_date IS NULL
            ORDER BY borrow_date
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(borrow)
    }

    async fn outstanding_for_user(&self, user_id: i32) -> AppResult<Vec<Borrow>> {
        let borrows = sqlx::query_as::<_, Borrow>(
            r#"
            SELECT * FROM borrows
            WHERE user_id = $1 AND return_date IS NULL
            ORDER BY expected_return_date
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(borrows)
    }

    async fn insert(&self, new: &NewBorrow, max_borrows: i16) -> AppResult<Borrow> {
        let mut tx = self.pool.begin().await?;

        // Lock the user row so concurrent borrows by the same user
        // serialize on the cap check.
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(new.user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", new.user_id)))?;

        let outstanding: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrows WHERE user_id = $1 AND return_date IS NULL",
        )
        .bind(new.user_id)
        .fetch_one(&mut *tx)
        .await?;

        if outstanding >= max_borrows as i64 {
            return Err(AppError::rule(BorrowViolation::BorrowLimitExceeded(max_borrows)));
        }

        let borrow = sqlx::query_as::<_, Borrow>(
            r#"
            INSERT INTO borrows (user_id, book_id, borrow_date, expected_return_date)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(new.book_id)
        .bind(new.borrow_date)
        .bind(new.expected_return_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(borrow)
    }

    async fn close(&self, borrow_id: i32, returned_on: NaiveDate) -> AppResult<Option<Borrow>> {
        // Single-shot update: the IS NULL predicate makes sure at most
        // one return closes the record.
        let closed = sqlx::query_as::<_, Borrow>(
            r#"
            UPDATE borrows SET return_date = $2
            WHERE id = $1 AND return_date IS NULL
            RETURNING *
            "#,
        )
        .bind(borrow_id)
        .bind(returned_on)
        .fetch_optional(&self.pool)
        .await?;
        Ok(closed)
    }

    async fn get(&self, borrow_id: i32) -> AppResult<Option<Borrow>> {
        let borrow = sqlx::query_as::<_, Borrow>("SELECT * FROM borrows WHERE id = $1")
            .bind(borrow_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(borrow)
    }
}
