//! This module defines the `PollsRepository` trait, which provides an interface
//! to the external store holding posts, their cached tallies, and the vote ledger.
//! It abstracts the handful of table operations the core is allowed to perform.
use polls_shared::types::{NewPost, NewVote, Post, PostId, Tally, VoteId, VoteRecord, VoterIdentity};

use crate::errors::PollsRepositoryError;
use crate::types::InsertVoteOutcome;

/// A trait that defines the interface for interacting with posts and votes.
///
/// Implementors must enforce uniqueness of `(post, account id)` on vote rows;
/// that constraint is the only real mutual exclusion between racing voters.
#[async_trait::async_trait]
pub trait PollsRepository: Send + Sync {
    /// Persists a new post with a zeroed tally and returns it as stored.
    async fn create_post(&self, post: &NewPost) -> Result<Post, PollsRepositoryError>;

    /// Fetches a post, including hidden ones, with its current tally and window.
    async fn get_post(&self, post_id: PostId) -> Result<Option<Post>, PollsRepositoryError>;

    /// Lists the ids of every stored post.
    async fn list_post_ids(&self) -> Result<Vec<PostId>, PollsRepositoryError>;

    /// Finds the vote row on `post_id` matching the voter's account id OR anonymous token.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(VoteRecord))` - The earliest matching row
    /// * `Ok(None)` - The voter has not voted on this post
    async fn find_vote(
        &self,
        post_id: PostId,
        identity: &VoterIdentity,
    ) -> Result<Option<VoteRecord>, PollsRepositoryError>;

    /// Appends a vote row carrying both identity fields.
    ///
    /// # Returns
    ///
    /// * `Ok(InsertVoteOutcome::Inserted)` - The row is durable
    /// * `Ok(InsertVoteOutcome::Conflict)` - The uniqueness constraint fired
    /// * `Err(PollsRepositoryError)` - Any other store failure
    async fn insert_vote(&self, vote: &NewVote) -> Result<InsertVoteOutcome, PollsRepositoryError>;

    /// Adds an inserted vote to its post's tally exactly once.
    ///
    /// Marks the vote row as applied and increments the chosen counter and the
    /// running total in a single atomic step at the store.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The tally was incremented by this call
    /// * `Ok(false)` - The vote had already been applied (or no longer exists)
    async fn apply_vote_to_tally(&self, vote_id: VoteId) -> Result<bool, PollsRepositoryError>;

    /// Lists every vote row recorded for a post, oldest first.
    async fn list_votes(&self, post_id: PostId) -> Result<Vec<VoteRecord>, PollsRepositoryError>;

    /// Overwrites a post's tally if it still equals `expected`.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The tally was replaced
    /// * `Ok(false)` - The stored tally changed since it was read, or the post is gone
    async fn compare_and_set_tally(
        &self,
        post_id: PostId,
        expected: &Tally,
        replacement: &Tally,
    ) -> Result<bool, PollsRepositoryError>;

    /// Server-side predicate: does the private post's code equal `attempt`?
    ///
    /// The comparison happens inside the store; only a boolean leaves it.
    async fn access_code_matches(
        &self,
        post_id: PostId,
        attempt: &str,
    ) -> Result<bool, PollsRepositoryError>;
}
