//! Library circulation backend
//!
//! Tracks book borrowing and return transactions, enforces per-user
//! borrowing policy, computes late-return penalties and sends
//! confirmation and reminder emails.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
