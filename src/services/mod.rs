//! Business logic services

pub mod borrows;
pub mod email;
pub mod scheduler;

use std::sync::Arc;

use crate::{config::EmailConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub borrows: borrows::BorrowsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        email_config: EmailConfig,
        scheduler: Arc<dyn scheduler::ReminderScheduler>,
    ) -> Self {
        let notifier = Arc::new(email::EmailNotifier::new(email_config));
        Self {
            borrows: borrows::BorrowsService::new(
                Arc::new(repository.borrows),
                Arc::new(repository.users),
                Arc::new(repository.books),
                notifier,
                scheduler,
            ),
        }
    }
}
