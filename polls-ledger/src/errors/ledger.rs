//! Error types for the vote ledger.
//!
//! Policy rejections are expected outcomes that the UI turns into an
//! instructional message. Everything else in [`LedgerError`] is a failure.
use polls_repository::{ModerationRepositoryError, PollsRepositoryError};
use polls_shared::types::{PostId, WindowState};
use thiserror::Error;

use crate::errors::AccessError;

/// A vote refused by policy rather than by a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyRejection {
    #[error("voting is not open ({0:?})")]
    VotingNotOpen(WindowState),

    #[error("sign-in required")]
    SignInRequired,

    #[error("account is banned")]
    Banned,

    #[error("post is locked")]
    Locked,

    #[error("post is unavailable")]
    PostUnavailable,
}

impl PolicyRejection {
    /// Instructional text shown to the voter.
    pub fn user_message(&self) -> &'static str {
        match self {
            PolicyRejection::VotingNotOpen(WindowState::Countdown) => {
                "Voting is not open yet. Check back when the countdown ends."
            }
            PolicyRejection::VotingNotOpen(WindowState::Closed) => {
                "Voting is not open. This poll has closed."
            }
            PolicyRejection::VotingNotOpen(_) => "Voting is not open.",
            PolicyRejection::SignInRequired => "Sign in to cast your vote.",
            PolicyRejection::Banned => "This account can no longer vote.",
            PolicyRejection::Locked => "Enter the access code to view and vote on this post.",
            PolicyRejection::PostUnavailable => "This post is no longer available.",
        }
    }
}

/// Represents errors that can occur while casting or resuming a vote.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Vote rejected: {0}")]
    Rejected(#[from] PolicyRejection),

    #[error("Post not found: {0}")]
    PostNotFound(PostId),

    #[error("Option {option_index} does not exist on post {post_id}")]
    InvalidOption { post_id: PostId, option_index: usize },

    #[error("Vote on post {0} conflicted but no existing vote was found")]
    ConflictUnresolved(PostId),

    #[error("Access check failed: {0}")]
    Access(#[from] AccessError),

    #[error("Repository error: {0}")]
    Repository(#[from] PollsRepositoryError),

    #[error("Moderation repository error: {0}")]
    Moderation(#[from] ModerationRepositoryError),
}

impl LedgerError {
    /// Whether the whole cast can be safely retried.
    ///
    /// Only store failures qualify. A retried cast starts again from the
    /// ledger lookup, so a vote that did land is reported as already cast.
    pub fn is_retryable(&self) -> bool {
        match self {
            LedgerError::Repository(e) | LedgerError::Access(AccessError::Repository(e)) => {
                is_transient(e)
            }
            LedgerError::Moderation(_) => true,
            _ => false,
        }
    }

    /// The policy rejection behind this error, if any.
    pub fn rejection(&self) -> Option<PolicyRejection> {
        match self {
            LedgerError::Rejected(rejection) => Some(*rejection),
            _ => None,
        }
    }

    /// Text shown to the voter: the instruction for policy rejections, a
    /// generic retry prompt otherwise.
    pub fn user_message(&self) -> &'static str {
        match self {
            LedgerError::Rejected(rejection) => rejection.user_message(),
            LedgerError::PostNotFound(_) | LedgerError::Access(AccessError::PostNotFound(_)) => {
                PolicyRejection::PostUnavailable.user_message()
            }
            _ => "Something went wrong. Please try again.",
        }
    }
}

fn is_transient(error: &PollsRepositoryError) -> bool {
    matches!(
        error,
        PollsRepositoryError::DatabaseError(_) | PollsRepositoryError::Unavailable(_)
    )
}
