//! Delayed scheduling of return reminders

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::borrows::BorrowsService;

/// A pending reminder: the borrow to look at and how long to wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderTask {
    pub borrow_id: i32,
    pub delay: Duration,
}

/// Fire-once delayed task scheduling.
///
/// There is no cancel: a reminder armed for a borrow that gets returned
/// early still fires, and the handler drops it on its closed-record
/// check.
#[cfg_attr(test, mockall::automock)]
pub trait ReminderScheduler: Send + Sync {
    fn schedule(&self, borrow_id: i32, delay: Duration);
}

/// In-process scheduler backed by the tokio runtime.
///
/// Armed reminders do not survive a restart; deployments that need
/// durable firing can put a persistent queue behind the same trait.
pub struct TokioReminderScheduler {
    tx: mpsc::UnboundedSender<ReminderTask>,
}

impl TokioReminderScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReminderTask>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ReminderScheduler for TokioReminderScheduler {
    fn schedule(&self, borrow_id: i32, delay: Duration) {
        if self.tx.send(ReminderTask { borrow_id, delay }).is_err() {
            tracing::warn!("reminder worker is gone, dropping reminder for borrow {}", borrow_id);
        }
    }
}

/// Drain the reminder queue: each task sleeps out its delay on its own
/// tokio task and then runs the handler. Handler errors are logged and
/// swallowed so one bad firing never takes the worker down.
pub fn spawn_reminder_worker(
    mut rx: mpsc::UnboundedReceiver<ReminderTask>,
    service: BorrowsService,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(task) = rx.recv().await {
            let service = service.clone();
            tokio::spawn(async move {
                tokio::time::sleep(task.delay).await;
                if let Err(e) = service.handle_reminder(task.borrow_id).await {
                    tracing::warn!("reminder for borrow {} failed: {}", task.borrow_id, e);
                }
            });
        }
    })
}
