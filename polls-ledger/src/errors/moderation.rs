use polls_repository::ModerationRepositoryError;
use polls_shared::types::PostId;
use thiserror::Error;

/// Represents errors that can occur while applying a moderation action.
#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Post not found: {0}")]
    PostNotFound(PostId),

    #[error("Repository error: {0}")]
    Repository(#[from] ModerationRepositoryError),
}
