use polls_repository::PollsRepositoryError;
use polls_shared::types::PostId;
use thiserror::Error;

/// Represents errors that can occur while deciding access to a post.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Post not found: {0}")]
    PostNotFound(PostId),

    #[error("Repository error: {0}")]
    Repository(#[from] PollsRepositoryError),
}
