//! Borrow (loan) model and related types

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::book::Book;

/// Borrow record from the ledger.
///
/// The lifecycle record of one loan: `borrow_date` is fixed at creation,
/// `return_date` transitions null -> set exactly once at return time.
/// A record with no return date is outstanding; closed records are kept
/// as history and never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrow {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub borrow_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

impl Borrow {
    /// An outstanding borrow has not been returned yet.
    pub fn is_outstanding(&self) -> bool {
        self.return_date.is_none()
    }

    /// Whole days past the due date when returned on `returned_on`,
    /// zero for an on-time or early return.
    pub fn days_late(&self, returned_on: NaiveDate) -> i64 {
        (returned_on - self.expected_return_date).num_days().max(0)
    }

    /// Whole days this borrow is overdue as of `today`.
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        self.days_late(today)
    }

    /// Whole days until the due date as of `today`; negative once overdue.
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.expected_return_date - today).num_days()
    }
}

/// Fields for a new ledger record
#[derive(Debug, Clone)]
pub struct NewBorrow {
    pub user_id: i32,
    pub book_id: i32,
    pub borrow_date: NaiveDate,
    pub expected_return_date: NaiveDate,
}

/// Outcome of returning a book
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReturnOutcome {
    pub borrow_id: i32,
    pub return_date: NaiveDate,
    pub days_late: i64,
    /// `days_late` times the user's daily penalty amount, zero when on time
    #[schema(value_type = f64)]
    pub penalty: Decimal,
}

impl ReturnOutcome {
    pub fn is_late(&self) -> bool {
        self.days_late > 0
    }
}

/// One outstanding borrow with book info, for listings
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowDetails {
    pub borrow_id: i32,
    pub book: Book,
    pub borrow_date: NaiveDate,
    pub expected_return_date: NaiveDate,
    pub is_overdue: bool,
}

/// One overdue borrow, for the penalty inspection listing
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OverdueBorrow {
    pub borrow_id: i32,
    pub book: Book,
    pub expected_return_date: NaiveDate,
    pub days_overdue: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn borrow_due(due: NaiveDate) -> Borrow {
        Borrow {
            id: 1,
            user_id: 1,
            book_id: 1,
            borrow_date: due - chrono::Duration::days(10),
            expected_return_date: due,
            return_date: None,
        }
    }

    #[test]
    fn late_return_counts_whole_days() {
        let due = date(2025, 3, 10);
        let borrow = borrow_due(due);
        assert_eq!(borrow.days_late(date(2025, 3, 15)), 5);
    }

    #[test]
    fn on_time_and_early_returns_are_not_late() {
        let due = date(2025, 3, 10);
        let borrow = borrow_due(due);
        assert_eq!(borrow.days_late(due), 0);
        assert_eq!(borrow.days_late(date(2025, 3, 1)), 0);
    }

    #[test]
    fn days_remaining_goes_negative_past_due() {
        let due = date(2025, 3, 10);
        let borrow = borrow_due(due);
        assert_eq!(borrow.days_remaining(date(2025, 3, 7)), 3);
        assert_eq!(borrow.days_remaining(due), 0);
        assert_eq!(borrow.days_remaining(date(2025, 3, 12)), -2);
    }

    #[test]
    fn outstanding_flips_when_returned() {
        let mut borrow = borrow_due(date(2025, 3, 10));
        assert!(borrow.is_outstanding());
        borrow.return_date = Some(date(2025, 3, 9));
        assert!(!borrow.is_outstanding());
    }
}
