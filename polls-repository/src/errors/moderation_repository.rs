use thiserror::Error;

#[derive(Debug, Error)]
/// Represents errors that can occur within the moderation repository.
///
/// This enum consolidates error conditions specific to database interactions,
/// such as SQLx errors during database operations.
pub enum ModerationRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
