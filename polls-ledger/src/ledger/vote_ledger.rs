//! Vote casting against a store without multi-statement transactions.
//!
//! The store's `UNIQUE (post_id, account_id)` constraint is the only real
//! guard against double votes. The lookup before the insert only spares
//! well-behaved sequential callers a write; concurrent callers that both
//! pass it are resolved when the loser's insert conflicts.
use std::sync::Arc;

use polls_repository::{InsertVoteOutcome, ModerationRepository, PollsRepository, PollsRepositoryError};
use polls_shared::types::{NewVote, Post, PostId, VoteId};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::{debug, info, warn};

use crate::access::{AccessDecision, AccessGate};
use crate::config::LedgerConfig;
use crate::errors::{LedgerError, PolicyRejection};
use crate::ledger::VoteOutcome;
use crate::session::SessionContext;
use crate::window::{evaluate, Clock};

/// Records votes and keeps post tallies in step with them.
pub struct VoteLedger {
    polls: Arc<dyn PollsRepository>,
    moderation: Arc<dyn ModerationRepository>,
    gate: AccessGate,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl VoteLedger {
    /// Creates a ledger with the default configuration.
    pub fn new(
        polls: Arc<dyn PollsRepository>,
        moderation: Arc<dyn ModerationRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_config(polls, moderation, clock, LedgerConfig::default())
    }

    pub fn with_config(
        polls: Arc<dyn PollsRepository>,
        moderation: Arc<dyn ModerationRepository>,
        clock: Arc<dyn Clock>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            gate: AccessGate::new(Arc::clone(&polls)),
            polls,
            moderation,
            clock,
            config,
        }
    }

    /// The access gate this ledger consults before every write.
    pub fn access_gate(&self) -> &AccessGate {
        &self.gate
    }

    /// Cast a vote for `option_index` on a post.
    ///
    /// Gates are checked in order and the first failing one rejects the vote
    /// before anything is read from or written to the ledger: the post must be
    /// visible and have the option, the voting window must accept votes, the
    /// voter must be signed in and not banned, and the access gate must let
    /// the session through.
    ///
    /// # Arguments
    ///
    /// * `post_id` - The post to vote on
    /// * `option_index` - Zero-based index of the chosen option
    /// * `session` - The voter's session; the vote is cached in it on success
    ///
    /// # Returns
    ///
    /// * `Ok(VoteOutcome::Accepted)` - The vote is recorded, possibly by a concurrent call that won the race
    /// * `Ok(VoteOutcome::AlreadyVoted)` - A vote already existed; no vote was written, but a
    ///   tally update still pending for that vote is applied
    /// * `Err(LedgerError::Rejected)` - A policy gate refused the vote
    /// * `Err(LedgerError)` - The store failed; see [`LedgerError::is_retryable`]
    pub async fn cast_vote(
        &self,
        post_id: PostId,
        option_index: usize,
        session: &SessionContext,
    ) -> Result<VoteOutcome, LedgerError> {
        let post = self
            .polls
            .get_post(post_id)
            .await?
            .ok_or(LedgerError::PostNotFound(post_id))?;
        self.check_policy(&post, option_index, session).await?;

        let identity = session.identity();
        if let Some(existing) = self.polls.find_vote(post_id, identity).await? {
            debug!(
                post_id = %post_id,
                existing_option_index = existing.option_index,
                "Voter already has a vote on this post"
            );
            if !existing.tally_applied {
                if let Err(e) = self.apply_with_retry(existing.id).await {
                    warn!(
                        vote_id = %existing.id,
                        post_id = %post_id,
                        error = %e,
                        "Existing vote still missing from tally, reconciliation required"
                    );
                }
            }
            session.record_vote(post_id, existing.option_index);
            return Ok(VoteOutcome::AlreadyVoted {
                existing_option_index: existing.option_index,
            });
        }

        let vote = NewVote::for_identity(post_id, option_index, identity);
        let outcome = match self.polls.insert_vote(&vote).await? {
            InsertVoteOutcome::Inserted(record) => {
                if let Err(e) = self.apply_with_retry(record.id).await {
                    warn!(
                        vote_id = %record.id,
                        post_id = %post_id,
                        error = %e,
                        "Vote recorded but tally update failed, reconciliation required"
                    );
                }
                VoteOutcome::Accepted { option_index }
            }
            InsertVoteOutcome::Conflict => {
                let winner = self
                    .polls
                    .find_vote(post_id, identity)
                    .await?
                    .ok_or(LedgerError::ConflictUnresolved(post_id))?;
                info!(
                    post_id = %post_id,
                    requested_option_index = option_index,
                    option_index = winner.option_index,
                    "Concurrent vote conflict resolved to the first recorded vote"
                );
                VoteOutcome::Accepted {
                    option_index: winner.option_index,
                }
            }
        };

        session.record_vote(post_id, outcome.option_index());
        session.mark_unlocked(post_id);
        Ok(outcome)
    }

    /// The voter's recorded option on a post, read from the ledger.
    ///
    /// The session's cached vote is overwritten with the answer, and dropped
    /// when the ledger has no row for this voter.
    pub async fn current_vote(
        &self,
        post_id: PostId,
        session: &SessionContext,
    ) -> Result<Option<usize>, LedgerError> {
        let cached = session.cached_vote(post_id);
        match self.polls.find_vote(post_id, session.identity()).await? {
            Some(vote) => {
                if cached != Some(vote.option_index) {
                    session.record_vote(post_id, vote.option_index);
                }
                Ok(Some(vote.option_index))
            }
            None => {
                if let Some(option_index) = cached {
                    warn!(
                        post_id = %post_id,
                        cached_option_index = option_index,
                        "Cached vote has no ledger row, discarding it"
                    );
                    session.forget_vote(post_id);
                }
                Ok(None)
            }
        }
    }

    /// Apply the tally increment for every vote row on a post that never got one.
    ///
    /// Resumes the tally step only; vote rows are never re-inserted.
    ///
    /// # Returns
    ///
    /// The number of rows whose increment was applied by this call.
    pub async fn resume_pending_tallies(&self, post_id: PostId) -> Result<usize, LedgerError> {
        let pending: Vec<VoteId> = self
            .polls
            .list_votes(post_id)
            .await?
            .into_iter()
            .filter(|vote| !vote.tally_applied)
            .map(|vote| vote.id)
            .collect();

        let mut applied = 0;
        for vote_id in pending {
            if self.apply_with_retry(vote_id).await? {
                applied += 1;
            }
        }

        if applied > 0 {
            info!(post_id = %post_id, applied, "Resumed pending tally updates");
        }
        Ok(applied)
    }

    async fn check_policy(
        &self,
        post: &Post,
        option_index: usize,
        session: &SessionContext,
    ) -> Result<(), LedgerError> {
        let post_id = post.id();
        if post.is_hidden() {
            return Err(reject(post_id, PolicyRejection::PostUnavailable));
        }
        if !post.has_option(option_index) {
            return Err(LedgerError::InvalidOption {
                post_id,
                option_index,
            });
        }

        let state = evaluate(self.clock.now(), post.window());
        if !state.accepts_votes() {
            return Err(reject(post_id, PolicyRejection::VotingNotOpen(state)));
        }

        let Some(account_id) = session.identity().account_id else {
            return Err(reject(post_id, PolicyRejection::SignInRequired));
        };
        if self.moderation.is_account_banned(account_id).await? {
            return Err(reject(post_id, PolicyRejection::Banned));
        }

        match self.gate.can_view(post, session, None).await? {
            AccessDecision::Locked => Err(reject(post_id, PolicyRejection::Locked)),
            AccessDecision::Unlocked | AccessDecision::NotRequired => Ok(()),
        }
    }

    async fn apply_with_retry(&self, vote_id: VoteId) -> Result<bool, PollsRepositoryError> {
        let strategy = ExponentialBackoff::from_millis(self.config.tally_retry_base_ms)
            .max_delay(self.config.tally_retry_max_delay)
            .map(jitter)
            .take(self.config.tally_retry_attempts);

        let applied = Retry::spawn(strategy, || self.polls.apply_vote_to_tally(vote_id)).await?;
        if applied {
            debug!(vote_id = %vote_id, "Tally updated");
        } else {
            debug!(vote_id = %vote_id, "Tally already reflects this vote");
        }
        Ok(applied)
    }
}

fn reject(post_id: PostId, rejection: PolicyRejection) -> LedgerError {
    debug!(post_id = %post_id, reason = %rejection, "Vote rejected by policy");
    LedgerError::Rejected(rejection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{generate_anonymous_token, MemoryStore};
    use crate::window::SystemClock;
    use async_trait::async_trait;
    use polls_repository::MemoryPollsRepository;
    use polls_shared::types::{
        AccessCode, AccountId, NewPost, Tally, VoteRecord, VoterIdentity, VotingWindow,
    };
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use uuid::Uuid;

    /// In-memory store with injectable failures.
    #[derive(Default)]
    struct FaultyRepository {
        inner: MemoryPollsRepository,
        hide_existing_vote_once: AtomicBool,
        tally_failures: AtomicUsize,
        fail_lookups: AtomicBool,
    }

    #[async_trait]
    impl PollsRepository for FaultyRepository {
        async fn create_post(&self, post: &NewPost) -> Result<Post, PollsRepositoryError> {
            self.inner.create_post(post).await
        }

        async fn get_post(&self, post_id: PostId) -> Result<Option<Post>, PollsRepositoryError> {
            self.inner.get_post(post_id).await
        }

        async fn list_post_ids(&self) -> Result<Vec<PostId>, PollsRepositoryError> {
            self.inner.list_post_ids().await
        }

        async fn find_vote(
            &self,
            post_id: PostId,
            identity: &VoterIdentity,
        ) -> Result<Option<VoteRecord>, PollsRepositoryError> {
            if self.fail_lookups.load(Ordering::SeqCst) {
                return Err(PollsRepositoryError::Unavailable("connection reset".to_string()));
            }
            if self.hide_existing_vote_once.swap(false, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_vote(post_id, identity).await
        }

        async fn insert_vote(&self, vote: &NewVote) -> Result<InsertVoteOutcome, PollsRepositoryError> {
            self.inner.insert_vote(vote).await
        }

        async fn apply_vote_to_tally(&self, vote_id: VoteId) -> Result<bool, PollsRepositoryError> {
            if self.tally_failures.load(Ordering::SeqCst) > 0 {
                self.tally_failures.fetch_sub(1, Ordering::SeqCst);
                return Err(PollsRepositoryError::Unavailable("timeout".to_string()));
            }
            self.inner.apply_vote_to_tally(vote_id).await
        }

        async fn list_votes(&self, post_id: PostId) -> Result<Vec<VoteRecord>, PollsRepositoryError> {
            self.inner.list_votes(post_id).await
        }

        async fn compare_and_set_tally(
            &self,
            post_id: PostId,
            expected: &Tally,
            replacement: &Tally,
        ) -> Result<bool, PollsRepositoryError> {
            self.inner.compare_and_set_tally(post_id, expected, replacement).await
        }

        async fn access_code_matches(
            &self,
            post_id: PostId,
            attempt: &str,
        ) -> Result<bool, PollsRepositoryError> {
            self.inner.access_code_matches(post_id, attempt).await
        }
    }

    fn cat_or_dog(access_code: Option<&str>) -> NewPost {
        NewPost {
            owner_id: AccountId::new(Uuid::new_v4()),
            title: "Cat or Dog".to_string(),
            images: vec!["cat.png".to_string(), "dog.png".to_string()],
            options: vec!["Cat".to_string(), "Dog".to_string()],
            access_code: access_code.map(|c| AccessCode::parse(c).unwrap()),
            window: VotingWindow::always_open(),
        }
    }

    fn signed_in_session() -> SessionContext {
        SessionContext::new(
            VoterIdentity::authenticated(generate_anonymous_token(), AccountId::new(Uuid::new_v4())),
            Arc::new(MemoryStore::new()),
        )
    }

    fn build_ledger(polls: Arc<dyn PollsRepository>, moderation: Arc<dyn ModerationRepository>) -> VoteLedger {
        VoteLedger::with_config(
            polls,
            moderation,
            Arc::new(SystemClock),
            LedgerConfig::with_tally_retry(3, 1),
        )
    }

    #[tokio::test]
    async fn test_conflict_resolves_to_winning_vote() {
        let polls = Arc::new(FaultyRepository::default());
        let ledger = build_ledger(polls.clone(), Arc::new(MemoryPollsRepository::new()));
        let post = polls.create_post(&cat_or_dog(None)).await.unwrap();
        let session = signed_in_session();

        // Another request from the same voter lands between our lookup and insert.
        polls
            .inner
            .insert_vote(&NewVote::for_identity(post.id(), 1, session.identity()))
            .await
            .unwrap();
        polls.hide_existing_vote_once.store(true, Ordering::SeqCst);

        let outcome = ledger.cast_vote(post.id(), 0, &session).await.unwrap();

        assert_eq!(outcome, VoteOutcome::Accepted { option_index: 1 });
        assert_eq!(polls.list_votes(post.id()).await.unwrap().len(), 1);
        assert_eq!(session.cached_vote(post.id()), Some(1));
    }

    #[tokio::test]
    async fn test_tally_retry_recovers_from_transient_failures() {
        let polls = Arc::new(FaultyRepository::default());
        let ledger = build_ledger(polls.clone(), Arc::new(MemoryPollsRepository::new()));
        let post = polls.create_post(&cat_or_dog(None)).await.unwrap();
        polls.tally_failures.store(2, Ordering::SeqCst);

        let outcome = ledger.cast_vote(post.id(), 1, &signed_in_session()).await.unwrap();

        assert!(outcome.accepted());
        let post = polls.get_post(post.id()).await.unwrap().unwrap();
        assert_eq!(post.tally().counts(), &[0, 1]);
        assert_eq!(post.tally().total(), 1);
    }

    #[tokio::test]
    async fn test_tally_failure_keeps_vote_and_resumes_later() {
        let polls = Arc::new(FaultyRepository::default());
        let ledger = build_ledger(polls.clone(), Arc::new(MemoryPollsRepository::new()));
        let post = polls.create_post(&cat_or_dog(None)).await.unwrap();
        polls.tally_failures.store(usize::MAX, Ordering::SeqCst);

        let outcome = ledger.cast_vote(post.id(), 1, &signed_in_session()).await.unwrap();
        assert_eq!(outcome, VoteOutcome::Accepted { option_index: 1 });

        let stale = polls.get_post(post.id()).await.unwrap().unwrap();
        assert_eq!(stale.tally().total(), 0);
        let votes = polls.list_votes(post.id()).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert!(!votes[0].tally_applied);

        polls.tally_failures.store(0, Ordering::SeqCst);
        assert_eq!(ledger.resume_pending_tallies(post.id()).await.unwrap(), 1);
        assert_eq!(ledger.resume_pending_tallies(post.id()).await.unwrap(), 0);

        let post = polls.get_post(post.id()).await.unwrap().unwrap();
        assert_eq!(post.tally().counts(), &[0, 1]);
        assert_eq!(post.tally().total(), 1);
    }

    #[tokio::test]
    async fn test_repeated_cast_applies_pending_tally_of_existing_vote() {
        let polls = Arc::new(FaultyRepository::default());
        let ledger = build_ledger(polls.clone(), Arc::new(MemoryPollsRepository::new()));
        let post = polls.create_post(&cat_or_dog(None)).await.unwrap();
        let session = signed_in_session();
        polls.tally_failures.store(4, Ordering::SeqCst);

        let first = ledger.cast_vote(post.id(), 1, &session).await.unwrap();
        assert_eq!(first, VoteOutcome::Accepted { option_index: 1 });
        assert!(!polls.list_votes(post.id()).await.unwrap()[0].tally_applied);

        let second = ledger.cast_vote(post.id(), 1, &session).await.unwrap();
        assert_eq!(second, VoteOutcome::AlreadyVoted { existing_option_index: 1 });

        let votes = polls.list_votes(post.id()).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert!(votes[0].tally_applied);
        let post = polls.get_post(post.id()).await.unwrap().unwrap();
        assert_eq!(post.tally().counts(), &[0, 1]);
        assert_eq!(post.tally().total(), 1);
        assert_eq!(ledger.resume_pending_tallies(post.id()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_retryable_and_writes_nothing() {
        let polls = Arc::new(FaultyRepository::default());
        let ledger = build_ledger(polls.clone(), Arc::new(MemoryPollsRepository::new()));
        let post = polls.create_post(&cat_or_dog(None)).await.unwrap();
        let session = signed_in_session();
        polls.fail_lookups.store(true, Ordering::SeqCst);

        let error = ledger.cast_vote(post.id(), 0, &session).await.unwrap_err();
        assert!(error.is_retryable());
        assert!(polls.list_votes(post.id()).await.unwrap().is_empty());

        polls.fail_lookups.store(false, Ordering::SeqCst);
        let outcome = ledger.cast_vote(post.id(), 0, &session).await.unwrap();
        assert_eq!(outcome, VoteOutcome::Accepted { option_index: 0 });
    }

    #[tokio::test]
    async fn test_anonymous_voter_must_sign_in() {
        let polls = Arc::new(MemoryPollsRepository::new());
        let ledger = build_ledger(polls.clone(), polls.clone());
        let post = polls.create_post(&cat_or_dog(None)).await.unwrap();
        let session = SessionContext::new(
            VoterIdentity::anonymous(generate_anonymous_token()),
            Arc::new(MemoryStore::new()),
        );

        let error = ledger.cast_vote(post.id(), 0, &session).await.unwrap_err();
        assert_eq!(error.rejection(), Some(PolicyRejection::SignInRequired));
        assert!(!error.is_retryable());
        assert!(polls.list_votes(post.id()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_banned_account_is_rejected() {
        let polls = Arc::new(MemoryPollsRepository::new());
        let ledger = build_ledger(polls.clone(), polls.clone());
        let post = polls.create_post(&cat_or_dog(None)).await.unwrap();
        let session = signed_in_session();
        let account_id = session.identity().account_id.unwrap();
        polls.set_account_banned(account_id, true).await.unwrap();

        let error = ledger.cast_vote(post.id(), 0, &session).await.unwrap_err();
        assert_eq!(error.rejection(), Some(PolicyRejection::Banned));
    }

    #[tokio::test]
    async fn test_hidden_post_is_unavailable() {
        let polls = Arc::new(MemoryPollsRepository::new());
        let ledger = build_ledger(polls.clone(), polls.clone());
        let post = polls.create_post(&cat_or_dog(None)).await.unwrap();
        polls.set_post_hidden(post.id(), true).await.unwrap();

        let error = ledger.cast_vote(post.id(), 0, &signed_in_session()).await.unwrap_err();
        assert_eq!(error.rejection(), Some(PolicyRejection::PostUnavailable));
    }

    #[tokio::test]
    async fn test_unknown_post_and_option() {
        let polls = Arc::new(MemoryPollsRepository::new());
        let ledger = build_ledger(polls.clone(), polls.clone());
        let post = polls.create_post(&cat_or_dog(None)).await.unwrap();
        let session = signed_in_session();

        assert!(matches!(
            ledger.cast_vote(PostId::new(Uuid::new_v4()), 0, &session).await,
            Err(LedgerError::PostNotFound(_))
        ));
        assert!(matches!(
            ledger.cast_vote(post.id(), 2, &session).await,
            Err(LedgerError::InvalidOption { option_index: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_private_post_requires_unlock() {
        let polls = Arc::new(MemoryPollsRepository::new());
        let ledger = build_ledger(polls.clone(), polls.clone());
        let post = polls.create_post(&cat_or_dog(Some("ABC123"))).await.unwrap();
        let session = signed_in_session();

        let error = ledger.cast_vote(post.id(), 0, &session).await.unwrap_err();
        assert_eq!(error.rejection(), Some(PolicyRejection::Locked));

        assert!(ledger.access_gate().unlock(&post, "abc123", &session).await.unwrap());
        let outcome = ledger.cast_vote(post.id(), 0, &session).await.unwrap();
        assert_eq!(outcome, VoteOutcome::Accepted { option_index: 0 });
    }

    #[tokio::test]
    async fn test_current_vote_overwrites_stale_cache() {
        let polls = Arc::new(MemoryPollsRepository::new());
        let ledger = build_ledger(polls.clone(), polls.clone());
        let post = polls.create_post(&cat_or_dog(None)).await.unwrap();
        let session = signed_in_session();

        session.record_vote(post.id(), 1);
        assert_eq!(ledger.current_vote(post.id(), &session).await.unwrap(), None);
        assert_eq!(session.cached_vote(post.id()), None);

        polls
            .insert_vote(&NewVote::for_identity(post.id(), 0, session.identity()))
            .await
            .unwrap();
        session.record_vote(post.id(), 1);
        assert_eq!(ledger.current_vote(post.id(), &session).await.unwrap(), Some(0));
        assert_eq!(session.cached_vote(post.id()), Some(0));
    }
}
