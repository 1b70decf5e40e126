//! Error types for the polls repository.
//! Defines specific errors that can occur during database operations on posts and votes.
use polls_shared::PostValidationError;
use thiserror::Error;

/// Represents errors that can occur within the polls repository.
///
/// This enum consolidates error conditions specific to store interactions,
/// such as SQLx errors and rows that fail domain validation once loaded.
#[derive(Debug, Error)]
pub enum PollsRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Invalid post: {0}")]
    InvalidPost(#[from] PostValidationError),

    #[error("Invalid option index: {0}")]
    InvalidOptionIndex(i64),

    #[error("Invalid vote row: {0}")]
    InvalidVote(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
