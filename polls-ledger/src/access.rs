//! Access gate for private posts.
//!
//! Public posts never need a code. A private post is unlocked for a session
//! either by a correct access code, checked by the store so the code itself
//! never reaches this process, or by the voter already having a vote on it.
//! Invalid attempts are not rate limited here.
use std::sync::Arc;

use polls_repository::PollsRepository;
use polls_shared::types::Post;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AccessError;
use crate::session::SessionContext;

/// Whether a viewer may see a post's results and vote on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    Unlocked,
    Locked,
    NotRequired,
}

impl AccessDecision {
    pub fn permits(&self) -> bool {
        !matches!(self, AccessDecision::Locked)
    }
}

pub struct AccessGate {
    polls: Arc<dyn PollsRepository>,
}

impl AccessGate {
    pub fn new(polls: Arc<dyn PollsRepository>) -> Self {
        Self { polls }
    }

    /// Decide whether the session may view `post`.
    ///
    /// # Arguments
    ///
    /// * `post` - The post being displayed
    /// * `session` - The viewer's session, consulted for earlier unlocks
    /// * `provided_code` - An access code submitted with this request, if any
    ///
    /// # Returns
    ///
    /// * `Ok(AccessDecision::NotRequired)` - The post is public
    /// * `Ok(AccessDecision::Unlocked)` - Unlocked this session, by the provided code, or by a prior vote
    /// * `Ok(AccessDecision::Locked)` - None of the above
    /// * `Err(AccessError::PostNotFound)` - The post is hidden
    pub async fn can_view(
        &self,
        post: &Post,
        session: &SessionContext,
        provided_code: Option<&str>,
    ) -> Result<AccessDecision, AccessError> {
        if post.is_hidden() {
            return Err(AccessError::PostNotFound(post.id()));
        }
        if !post.is_private() {
            return Ok(AccessDecision::NotRequired);
        }
        if session.is_unlocked(post.id()) {
            return Ok(AccessDecision::Unlocked);
        }
        if let Some(code) = provided_code {
            if self.unlock(post, code, session).await? {
                return Ok(AccessDecision::Unlocked);
            }
        }
        if self
            .polls
            .find_vote(post.id(), session.identity())
            .await?
            .is_some()
        {
            session.mark_unlocked(post.id());
            return Ok(AccessDecision::Unlocked);
        }

        Ok(AccessDecision::Locked)
    }

    /// Submit an access code for a post.
    ///
    /// The comparison is case-insensitive and happens in the store. A valid
    /// code unlocks the post for the rest of this session only.
    pub async fn unlock(
        &self,
        post: &Post,
        code: &str,
        session: &SessionContext,
    ) -> Result<bool, AccessError> {
        if post.is_hidden() {
            return Err(AccessError::PostNotFound(post.id()));
        }
        if !post.is_private() {
            return Ok(true);
        }
        if code.trim().is_empty() {
            return Ok(false);
        }

        let valid = self.polls.access_code_matches(post.id(), code).await?;
        if valid {
            session.mark_unlocked(post.id());
            info!(post_id = %post.id(), "Private post unlocked");
        } else {
            debug!(post_id = %post.id(), "Rejected access code");
        }
        Ok(valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{generate_anonymous_token, MemoryStore};
    use polls_repository::MemoryPollsRepository;
    use polls_shared::types::{
        AccessCode, AccountId, NewPost, NewVote, VoterIdentity, VotingWindow,
    };
    use polls_repository::ModerationRepository;
    use uuid::Uuid;

    fn new_post(access_code: Option<&str>) -> NewPost {
        NewPost {
            owner_id: AccountId::new(Uuid::new_v4()),
            title: "Cat or Dog".to_string(),
            images: vec!["cat.png".to_string(), "dog.png".to_string()],
            options: vec!["Cat".to_string(), "Dog".to_string()],
            access_code: access_code.map(|c| AccessCode::parse(c).unwrap()),
            window: VotingWindow::always_open(),
        }
    }

    fn session() -> SessionContext {
        SessionContext::new(
            VoterIdentity::authenticated(generate_anonymous_token(), AccountId::new(Uuid::new_v4())),
            Arc::new(MemoryStore::new()),
        )
    }

    #[tokio::test]
    async fn test_public_post_needs_no_code() {
        let polls = Arc::new(MemoryPollsRepository::new());
        let gate = AccessGate::new(polls.clone());
        let post = polls.create_post(&new_post(None)).await.unwrap();

        let decision = gate.can_view(&post, &session(), Some("WRONG")).await.unwrap();
        assert_eq!(decision, AccessDecision::NotRequired);
    }

    #[tokio::test]
    async fn test_lowercase_code_unlocks_private_post() {
        let polls = Arc::new(MemoryPollsRepository::new());
        let gate = AccessGate::new(polls.clone());
        let post = polls.create_post(&new_post(Some("ABC123"))).await.unwrap();
        let session = session();

        assert_eq!(gate.can_view(&post, &session, None).await.unwrap(), AccessDecision::Locked);
        assert_eq!(
            gate.can_view(&post, &session, Some("abc123")).await.unwrap(),
            AccessDecision::Unlocked
        );
        assert_eq!(gate.can_view(&post, &session, None).await.unwrap(), AccessDecision::Unlocked);
    }

    #[tokio::test]
    async fn test_wrong_code_keeps_post_locked() {
        let polls = Arc::new(MemoryPollsRepository::new());
        let gate = AccessGate::new(polls.clone());
        let post = polls.create_post(&new_post(Some("ABC123"))).await.unwrap();
        let session = session();

        assert!(!gate.unlock(&post, "XYZ789", &session).await.unwrap());
        assert!(!gate.unlock(&post, "   ", &session).await.unwrap());
        assert_eq!(
            gate.can_view(&post, &session, Some("XYZ789")).await.unwrap(),
            AccessDecision::Locked
        );
    }

    #[tokio::test]
    async fn test_unlock_does_not_survive_a_new_session() {
        let polls = Arc::new(MemoryPollsRepository::new());
        let gate = AccessGate::new(polls.clone());
        let post = polls.create_post(&new_post(Some("ABC123"))).await.unwrap();

        assert!(gate.unlock(&post, "ABC123", &session()).await.unwrap());
        assert_eq!(gate.can_view(&post, &session(), None).await.unwrap(), AccessDecision::Locked);
    }

    #[tokio::test]
    async fn test_prior_vote_unlocks_private_post() {
        let polls = Arc::new(MemoryPollsRepository::new());
        let gate = AccessGate::new(polls.clone());
        let post = polls.create_post(&new_post(Some("ABC123"))).await.unwrap();
        let session = session();
        polls
            .insert_vote(&NewVote::for_identity(post.id(), 0, session.identity()))
            .await
            .unwrap();

        assert_eq!(gate.can_view(&post, &session, None).await.unwrap(), AccessDecision::Unlocked);
    }

    #[tokio::test]
    async fn test_hidden_post_is_not_found() {
        let polls = Arc::new(MemoryPollsRepository::new());
        let gate = AccessGate::new(polls.clone());
        let post = polls.create_post(&new_post(None)).await.unwrap();
        polls.set_post_hidden(post.id(), true).await.unwrap();
        let hidden = polls.get_post(post.id()).await.unwrap().unwrap();

        assert!(matches!(
            gate.can_view(&hidden, &session(), None).await,
            Err(AccessError::PostNotFound(_))
        ));
    }
}
