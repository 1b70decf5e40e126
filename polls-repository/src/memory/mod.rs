//! In-memory polls store for tests and local development.
//!
//! `MemoryPollsRepository` implements both repository traits over a single
//! lock-protected state, enforcing the same `(post, account)` uniqueness and
//! single-step tally increments as the PostgreSQL schema.
//!
//! # Example
//!
//! ```ignore
//! use polls_repository::{MemoryPollsRepository, PollsRepository};
//!
//! let repository = MemoryPollsRepository::new();
//! let post = repository.create_post(&new_post).await?;
//! let votes = repository.list_votes(post.id()).await?;
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use polls_shared::types::{
    AccessCode, AccountId, NewPost, NewVote, Post, PostId, PostParts, Tally, VoteId, VoteRecord,
    VoterIdentity,
};
use uuid::Uuid;

use crate::errors::{ModerationRepositoryError, PollsRepositoryError};
use crate::types::InsertVoteOutcome;
use crate::{ModerationRepository, PollsRepository};

struct StoredPost {
    parts: PostParts,
    access_code: Option<AccessCode>,
    seq: u64,
}

#[derive(Default)]
struct State {
    posts: HashMap<PostId, StoredPost>,
    votes: Vec<VoteRecord>,
    banned: HashSet<AccountId>,
    next_seq: u64,
}

/// In-memory repository mirroring the PostgreSQL constraints.
#[derive(Default)]
pub struct MemoryPollsRepository {
    state: RwLock<State>,
}

impl MemoryPollsRepository {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a post with explicit fields, e.g. a pre-existing tally.
    ///
    /// The parts are validated exactly as a fetched row would be.
    pub fn insert_post(
        &self,
        parts: PostParts,
        access_code: Option<AccessCode>,
    ) -> Result<Post, PollsRepositoryError> {
        let post = Post::from_parts(parts.clone())?;
        let mut state = self.write()?;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.posts.insert(
            parts.id,
            StoredPost {
                parts,
                access_code,
                seq,
            },
        );
        Ok(post)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, PollsRepositoryError> {
        self.state
            .read()
            .map_err(|_| PollsRepositoryError::Unavailable("state lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, PollsRepositoryError> {
        self.state
            .write()
            .map_err(|_| PollsRepositoryError::Unavailable("state lock poisoned".to_string()))
    }

    fn moderation_write(&self) -> Result<RwLockWriteGuard<'_, State>, ModerationRepositoryError> {
        self.state
            .write()
            .map_err(|_| ModerationRepositoryError::Unavailable("state lock poisoned".to_string()))
    }

    fn moderation_read(&self) -> Result<RwLockReadGuard<'_, State>, ModerationRepositoryError> {
        self.state
            .read()
            .map_err(|_| ModerationRepositoryError::Unavailable("state lock poisoned".to_string()))
    }

    fn current_tally(parts: &PostParts) -> Tally {
        Tally::new(parts.votes.clone(), parts.total_votes).unwrap_or_default()
    }
}

#[async_trait]
impl PollsRepository for MemoryPollsRepository {
    async fn create_post(&self, post: &NewPost) -> Result<Post, PollsRepositoryError> {
        let parts = PostParts {
            id: PostId::new(Uuid::new_v4()),
            owner_id: post.owner_id,
            title: post.title.clone(),
            images: post.images.clone(),
            options: post.options.clone(),
            votes: vec![0; post.images.len()],
            total_votes: 0,
            visibility: post.visibility(),
            window: post.window,
            hidden: false,
            created_at: Utc::now(),
        };
        self.insert_post(parts, post.access_code.clone())
    }

    async fn get_post(&self, post_id: PostId) -> Result<Option<Post>, PollsRepositoryError> {
        let state = self.read()?;
        state
            .posts
            .get(&post_id)
            .map(|stored| Post::from_parts(stored.parts.clone()).map_err(PollsRepositoryError::from))
            .transpose()
    }

    async fn list_post_ids(&self) -> Result<Vec<PostId>, PollsRepositoryError> {
        let state = self.read()?;
        let mut posts: Vec<(&PostId, u64)> = state.posts.iter().map(|(id, p)| (id, p.seq)).collect();
        posts.sort_by_key(|(_, seq)| *seq);
        Ok(posts.into_iter().map(|(id, _)| *id).collect())
    }

    async fn find_vote(
        &self,
        post_id: PostId,
        identity: &VoterIdentity,
    ) -> Result<Option<VoteRecord>, PollsRepositoryError> {
        let state = self.read()?;
        Ok(state
            .votes
            .iter()
            .find(|vote| vote.post_id == post_id && vote.matches(identity))
            .cloned())
    }

    async fn insert_vote(&self, vote: &NewVote) -> Result<InsertVoteOutcome, PollsRepositoryError> {
        if vote.account_id.is_none() && vote.anonymous_token.is_none() {
            return Err(PollsRepositoryError::InvalidVote(
                "a vote needs an account id or an anonymous token".to_string(),
            ));
        }

        let mut state = self.write()?;
        if !state.posts.contains_key(&vote.post_id) {
            return Err(PollsRepositoryError::InvalidVote(format!(
                "post {} does not exist",
                vote.post_id
            )));
        }

        if let Some(account_id) = vote.account_id {
            let taken = state
                .votes
                .iter()
                .any(|row| row.post_id == vote.post_id && row.account_id == Some(account_id));
            if taken {
                return Ok(InsertVoteOutcome::Conflict);
            }
        }

        let record = VoteRecord {
            id: VoteId(Uuid::new_v4()),
            post_id: vote.post_id,
            option_index: vote.option_index,
            account_id: vote.account_id,
            anonymous_token: vote.anonymous_token.clone(),
            tally_applied: false,
            created_at: Utc::now(),
        };
        state.votes.push(record.clone());
        Ok(InsertVoteOutcome::Inserted(record))
    }

    async fn apply_vote_to_tally(&self, vote_id: VoteId) -> Result<bool, PollsRepositoryError> {
        let mut state = self.write()?;
        let state = &mut *state;

        let Some(vote) = state
            .votes
            .iter_mut()
            .find(|vote| vote.id == vote_id && !vote.tally_applied)
        else {
            return Ok(false);
        };
        let Some(stored) = state.posts.get_mut(&vote.post_id) else {
            return Ok(false);
        };

        vote.tally_applied = true;
        let votes = &mut stored.parts.votes;
        if votes.len() <= vote.option_index {
            votes.resize(vote.option_index + 1, 0);
        }
        votes[vote.option_index] += 1;
        stored.parts.total_votes += 1;
        Ok(true)
    }

    async fn list_votes(&self, post_id: PostId) -> Result<Vec<VoteRecord>, PollsRepositoryError> {
        let state = self.read()?;
        Ok(state
            .votes
            .iter()
            .filter(|vote| vote.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn compare_and_set_tally(
        &self,
        post_id: PostId,
        expected: &Tally,
        replacement: &Tally,
    ) -> Result<bool, PollsRepositoryError> {
        let mut state = self.write()?;
        let Some(stored) = state.posts.get_mut(&post_id) else {
            return Ok(false);
        };
        if &Self::current_tally(&stored.parts) != expected {
            return Ok(false);
        }
        stored.parts.votes = replacement.counts().to_vec();
        stored.parts.total_votes = replacement.total();
        Ok(true)
    }

    async fn access_code_matches(
        &self,
        post_id: PostId,
        attempt: &str,
    ) -> Result<bool, PollsRepositoryError> {
        let state = self.read()?;
        Ok(state
            .posts
            .get(&post_id)
            .and_then(|stored| stored.access_code.as_ref())
            .is_some_and(|code| code.matches(attempt)))
    }
}

#[async_trait]
impl ModerationRepository for MemoryPollsRepository {
    async fn set_post_hidden(&self, post_id: PostId, hidden: bool) -> Result<bool, ModerationRepositoryError> {
        let mut state = self.moderation_write()?;
        Ok(match state.posts.get_mut(&post_id) {
            Some(stored) => {
                stored.parts.hidden = hidden;
                true
            }
            None => false,
        })
    }

    async fn delete_post(&self, post_id: PostId) -> Result<bool, ModerationRepositoryError> {
        let mut state = self.moderation_write()?;
        let removed = state.posts.remove(&post_id).is_some();
        state.votes.retain(|vote| vote.post_id != post_id);
        Ok(removed)
    }

    async fn set_account_banned(&self, account_id: AccountId, banned: bool) -> Result<(), ModerationRepositoryError> {
        let mut state = self.moderation_write()?;
        if banned {
            state.banned.insert(account_id);
        } else {
            state.banned.remove(&account_id);
        }
        Ok(())
    }

    async fn is_account_banned(&self, account_id: AccountId) -> Result<bool, ModerationRepositoryError> {
        let state = self.moderation_read()?;
        Ok(state.banned.contains(&account_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polls_shared::types::{AnonymousToken, VotingWindow};

    fn new_post(access_code: Option<&str>) -> NewPost {
        NewPost {
            owner_id: AccountId::new(Uuid::new_v4()),
            title: "Cat or Dog".to_string(),
            images: vec!["https://img/cat.png".into(), "https://img/dog.png".into()],
            options: vec!["Cat".into(), "Dog".into()],
            access_code: access_code.map(|c| AccessCode::parse(c).unwrap()),
            window: VotingWindow::always_open(),
        }
    }

    fn voter() -> VoterIdentity {
        VoterIdentity::authenticated(
            AnonymousToken::new(format!("anon_{}", Uuid::new_v4().simple())),
            AccountId::new(Uuid::new_v4()),
        )
    }

    #[tokio::test]
    async fn test_create_post_starts_with_zeroed_tally() {
        let repository = MemoryPollsRepository::new();
        let post = repository.create_post(&new_post(None)).await.unwrap();

        assert_eq!(post.tally().counts(), &[0, 0]);
        assert_eq!(post.tally().total(), 0);
        assert_eq!(repository.list_post_ids().await.unwrap(), vec![post.id()]);
    }

    #[tokio::test]
    async fn test_insert_vote_conflicts_on_same_account() {
        let repository = MemoryPollsRepository::new();
        let post = repository.create_post(&new_post(None)).await.unwrap();
        let identity = voter();

        let first = repository
            .insert_vote(&NewVote::for_identity(post.id(), 0, &identity))
            .await
            .unwrap();
        assert!(matches!(first, InsertVoteOutcome::Inserted(_)));

        let second = repository
            .insert_vote(&NewVote::for_identity(post.id(), 1, &identity))
            .await
            .unwrap();
        assert_eq!(second, InsertVoteOutcome::Conflict);
        assert_eq!(repository.list_votes(post.id()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_vote_to_tally_is_idempotent() {
        let repository = MemoryPollsRepository::new();
        let post = repository.create_post(&new_post(None)).await.unwrap();
        let InsertVoteOutcome::Inserted(vote) = repository
            .insert_vote(&NewVote::for_identity(post.id(), 1, &voter()))
            .await
            .unwrap()
        else {
            panic!("expected insert");
        };

        assert!(repository.apply_vote_to_tally(vote.id).await.unwrap());
        assert!(!repository.apply_vote_to_tally(vote.id).await.unwrap());

        let post = repository.get_post(post.id()).await.unwrap().unwrap();
        assert_eq!(post.tally().counts(), &[0, 1]);
        assert_eq!(post.tally().total(), 1);
    }

    #[tokio::test]
    async fn test_compare_and_set_tally_detects_changes() {
        let repository = MemoryPollsRepository::new();
        let post = repository.create_post(&new_post(None)).await.unwrap();
        let stale = Tally::new(vec![5, 0], 5).unwrap();
        let replacement = Tally::new(vec![1, 0], 1).unwrap();

        assert!(!repository
            .compare_and_set_tally(post.id(), &stale, &replacement)
            .await
            .unwrap());
        assert!(repository
            .compare_and_set_tally(post.id(), post.tally(), &replacement)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_access_code_matches_case_insensitively() {
        let repository = MemoryPollsRepository::new();
        let private = repository.create_post(&new_post(Some("ABC123"))).await.unwrap();
        let public = repository.create_post(&new_post(None)).await.unwrap();

        assert!(private.is_private());
        assert!(repository.access_code_matches(private.id(), "abc123").await.unwrap());
        assert!(!repository.access_code_matches(private.id(), "abc124").await.unwrap());
        assert!(!repository.access_code_matches(public.id(), "abc123").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_post_cascades_votes() {
        let repository = MemoryPollsRepository::new();
        let post = repository.create_post(&new_post(None)).await.unwrap();
        repository
            .insert_vote(&NewVote::for_identity(post.id(), 0, &voter()))
            .await
            .unwrap();

        assert!(repository.delete_post(post.id()).await.unwrap());
        assert!(repository.get_post(post.id()).await.unwrap().is_none());
        assert!(repository.list_votes(post.id()).await.unwrap().is_empty());
        assert!(!repository.delete_post(post.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_ban_and_unban() {
        let repository = MemoryPollsRepository::new();
        let account = AccountId::new(Uuid::new_v4());

        repository.set_account_banned(account, true).await.unwrap();
        assert!(repository.is_account_banned(account).await.unwrap());
        repository.set_account_banned(account, false).await.unwrap();
        assert!(!repository.is_account_banned(account).await.unwrap());
    }
}
