//! Error types for the polls repository.
//! Consolidates and re-exports error types related to repository operations.
mod moderation_repository;
mod polls_repository;

pub use moderation_repository::ModerationRepositoryError;
pub use polls_repository::PollsRepositoryError;
