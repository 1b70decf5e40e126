//! Error types for the Polls Reconciler application.
//! Consolidates configuration, database and reconciliation failures.
use polls_ledger::{LedgerError, ReconcileError};
use polls_repository::{ModerationRepositoryError, PollsRepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum ReconcilerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Repository error: {0}")]
    Repository(#[from] PollsRepositoryError),
    #[error("Moderation repository error: {0}")]
    ModerationRepository(#[from] ModerationRepositoryError),
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),
    #[error("Tracing error: {0}")]
    Tracing(String),
}
