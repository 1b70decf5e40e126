use polls_shared::types::{AccountId, PostId};

use crate::errors::ModerationRepositoryError;

/// Trait for the moderation mutations the core depends on.
///
/// Covers hiding and deleting posts and banning accounts. Deleting a post
/// cascades to its vote rows.
#[async_trait::async_trait]
pub trait ModerationRepository: Send + Sync {
    async fn set_post_hidden(&self, post_id: PostId, hidden: bool) -> Result<bool, ModerationRepositoryError>;
    async fn delete_post(&self, post_id: PostId) -> Result<bool, ModerationRepositoryError>;
    async fn set_account_banned(&self, account_id: AccountId, banned: bool) -> Result<(), ModerationRepositoryError>;
    async fn is_account_banned(&self, account_id: AccountId) -> Result<bool, ModerationRepositoryError>;
}
