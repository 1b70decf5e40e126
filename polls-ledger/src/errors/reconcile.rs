//! Error types for tally reconciliation.
use polls_repository::PollsRepositoryError;
use polls_shared::types::PostId;
use thiserror::Error;

/// Represents errors that can occur while recomputing a stored tally.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Post not found: {0}")]
    PostNotFound(PostId),

    #[error("Tally of post {post_id} kept changing after {attempts} attempts")]
    Contended { post_id: PostId, attempts: usize },

    #[error("Repository error: {0}")]
    Repository(#[from] PollsRepositoryError),
}
