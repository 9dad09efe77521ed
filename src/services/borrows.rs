//! Borrow lifecycle service: borrowing, returns, penalties and reminders

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult, BorrowViolation},
    models::{
        borrow::{Borrow, BorrowDetails, NewBorrow, OverdueBorrow, ReturnOutcome},
    },
    repository::{books::BookCatalog, borrows::BorrowLedger, users::UserDirectory},
    services::{email::NotificationSender, scheduler::ReminderScheduler},
};

/// Days before the due date at which daily reminders start.
const REMINDER_LEAD_DAYS: i64 = 3;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Clone)]
pub struct BorrowsService {
    ledger: Arc<dyn BorrowLedger>,
    users: Arc<dyn UserDirectory>,
    books: Arc<dyn BookCatalog>,
    notifier: Arc<dyn NotificationSender>,
    scheduler: Arc<dyn ReminderScheduler>,
}

impl BorrowsService {
    pub fn new(
        ledger: Arc<dyn BorrowLedger>,
        users: Arc<dyn UserDirectory>,
        books: Arc<dyn BookCatalog>,
        notifier: Arc<dyn NotificationSender>,
        scheduler: Arc<dyn ReminderScheduler>,
    ) -> Self {
        Self {
            ledger,
            users,
            books,
            notifier,
            scheduler,
        }
    }

    /// Borrow a book until `expected_return_date`.
    ///
    /// Every violated rule is reported, not just the first one found.
    /// The ledger re-checks the borrow cap inside its insert transaction,
    /// so concurrent requests cannot push a user past `max_borrows`.
    pub async fn borrow(
        &self,
        user_id: i32,
        book_id: i32,
        expected_return_date: NaiveDate,
    ) -> AppResult<Borrow> {
        let user = self.users.get_by_id(user_id).await?;
        let book = self.books.get_by_id(book_id).await?;
        let today = Utc::now().date_naive();

        let mut violations = Vec::new();
        if self.ledger.count_outstanding(user.id).await? >= user.max_borrows as i64 {
            violations.push(BorrowViolation::BorrowLimitExceeded(user.max_borrows));
        }
        if expected_return_date <= today {
            violations.push(BorrowViolation::InvalidDueDate);
        } else if expected_return_date > today + chrono::Duration::days(user.borrow_max_days as i64)
        {
            violations.push(BorrowViolation::DueDateTooFar(user.borrow_max_days));
        }
        if !violations.is_empty() {
            return Err(AppError::BorrowRejected(violations));
        }

        let borrow = self
            .ledger
            .insert(
                &NewBorrow {
                    user_id: user.id,
                    book_id: book.id,
                    borrow_date: today,
                    expected_return_date,
                },
                user.max_borrows,
            )
            .await?;

        let body = format!(
            "You have successfully borrowed {}. Please return it by {}.",
            book.title, borrow.expected_return_date
        );
        if let Err(e) = self
            .notifier
            .send(&user.email, "Book Borrowed Successfully", &body)
            .await
        {
            tracing::warn!("could not send borrow confirmation to {}: {}", user.email, e);
        }

        // Reminders start 3 days ahead of the due date; loans due sooner
        // than that get none armed at creation.
        let lead_days = borrow.days_remaining(today) - REMINDER_LEAD_DAYS;
        if lead_days > 0 {
            self.scheduler
                .schedule(borrow.id, Duration::from_secs(lead_days as u64 * SECONDS_PER_DAY));
        }

        Ok(borrow)
    }

    /// Return a borrowed book and settle any late penalty.
    pub async fn return_book(&self, user_id: i32, book_id: i32) -> AppResult<ReturnOutcome> {
        let user = self.users.get_by_id(user_id).await?;
        let book = self.books.get_by_id(book_id).await?;

        let Some(borrow) = self.ledger.find_outstanding(user.id, book.id).await? else {
            return Err(AppError::rule(BorrowViolation::NotCurrentlyBorrowed));
        };

        let today = Utc::now().date_naive();
        // The ledger only closes a record that is still open; losing that
        // race to another return reads as not-currently-borrowed.
        let Some(closed) = self.ledger.close(borrow.id, today).await? else {
            return Err(AppError::rule(BorrowViolation::NotCurrentlyBorrowed));
        };

        let days_late = closed.days_late(today);
        Ok(ReturnOutcome {
            borrow_id: closed.id,
            return_date: today,
            days_late,
            penalty: Decimal::from(days_late) * user.penalty_amount,
        })
    }

    /// The user's outstanding borrows, soonest due first.
    pub async fn outstanding_for_user(&self, user_id: i32) -> AppResult<Vec<BorrowDetails>> {
        let user = self.users.get_by_id(user_id).await?;
        let today = Utc::now().date_naive();

        let mut details = Vec::new();
        for borrow in self.ledger.outstanding_for_user(user.id).await? {
            let book = self.books.get_by_id(borrow.book_id).await?;
            details.push(BorrowDetails {
                borrow_id: borrow.id,
                book,
                borrow_date: borrow.borrow_date,
                expected_return_date: borrow.expected_return_date,
                is_overdue: borrow.days_overdue(today) > 0,
            });
        }
        Ok(details)
    }

    /// Read-only penalty inspection: every outstanding borrow already
    /// past its due date. Empty when nothing qualifies.
    pub async fn list_overdue(&self, user_id: i32) -> AppResult<Vec<OverdueBorrow>> {
        let user = self.users.get_by_id(user_id).await?;
        let today = Utc::now().date_naive();

        let mut overdue = Vec::new();
        for borrow in self.ledger.outstanding_for_user(user.id).await? {
            let days = borrow.days_overdue(today);
            if days > 0 {
                let book = self.books.get_by_id(borrow.book_id).await?;
                overdue.push(OverdueBorrow {
                    borrow_id: borrow.id,
                    book,
                    expected_return_date: borrow.expected_return_date,
                    days_overdue: days,
                });
            }
        }
        Ok(overdue)
    }

    /// One firing of the return reminder for `borrow_id`.
    ///
    /// A missing or already-closed borrow is an expected race, not an
    /// error: the firing just ends. Otherwise the reminder is sent and,
    /// inside the final 3 days before the due date, the task re-arms
    /// itself for the next day.
    pub async fn handle_reminder(&self, borrow_id: i32) -> AppResult<()> {
        let Some(borrow) = self.ledger.get(borrow_id).await? else {
            tracing::debug!("borrow {} no longer exists, dropping reminder", borrow_id);
            return Ok(());
        };
        if !borrow.is_outstanding() {
            return Ok(());
        }

        let user = self.users.get_by_id(borrow.user_id).await?;
        let book = self.books.get_by_id(borrow.book_id).await?;

        let body = format!(
            "Dear {},\n\nThis is a reminder that your borrowed book \"{}\" is due on {}. \
             Please return it on time to avoid penalties.\n\nThank you!",
            user.username, book.title, borrow.expected_return_date
        );
        if let Err(e) = self
            .notifier
            .send(&user.email, "Book Return Reminder", &body)
            .await
        {
            tracing::warn!("could not send return reminder to {}: {}", user.email, e);
        }

        let today = Utc::now().date_naive();
        let days_remaining = borrow.days_remaining(today);
        if (1..=REMINDER_LEAD_DAYS).contains(&days_remaining) {
            self.scheduler
                .schedule(borrow.id, Duration::from_secs(SECONDS_PER_DAY));
        }

        Ok(())
    }
}
