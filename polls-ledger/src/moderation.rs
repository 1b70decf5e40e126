//! Administrative actions that change what the ledger will accept.
use std::sync::Arc;

use polls_repository::ModerationRepository;
use polls_shared::types::{AccountId, PostId};
use tracing::info;

use crate::errors::ModerationError;

pub struct ModerationService {
    moderation: Arc<dyn ModerationRepository>,
}

impl ModerationService {
    pub fn new(moderation: Arc<dyn ModerationRepository>) -> Self {
        Self { moderation }
    }

    /// Soft-delete a post. Hidden posts refuse votes and cannot be viewed.
    pub async fn hide_post(&self, post_id: PostId) -> Result<(), ModerationError> {
        self.set_hidden(post_id, true).await
    }

    pub async fn unhide_post(&self, post_id: PostId) -> Result<(), ModerationError> {
        self.set_hidden(post_id, false).await
    }

    /// Permanently delete a post together with its vote rows.
    pub async fn delete_post(&self, post_id: PostId) -> Result<(), ModerationError> {
        if !self.moderation.delete_post(post_id).await? {
            return Err(ModerationError::PostNotFound(post_id));
        }
        info!(post_id = %post_id, "Post deleted");
        Ok(())
    }

    pub async fn ban_account(&self, account_id: AccountId) -> Result<(), ModerationError> {
        self.moderation.set_account_banned(account_id, true).await?;
        info!(account_id = %account_id, "Account banned");
        Ok(())
    }

    pub async fn unban_account(&self, account_id: AccountId) -> Result<(), ModerationError> {
        self.moderation.set_account_banned(account_id, false).await?;
        info!(account_id = %account_id, "Account unbanned");
        Ok(())
    }

    pub async fn is_banned(&self, account_id: AccountId) -> Result<bool, ModerationError> {
        Ok(self.moderation.is_account_banned(account_id).await?)
    }

    async fn set_hidden(&self, post_id: PostId, hidden: bool) -> Result<(), ModerationError> {
        if !self.moderation.set_post_hidden(post_id, hidden).await? {
            return Err(ModerationError::PostNotFound(post_id));
        }
        info!(post_id = %post_id, hidden, "Post visibility changed");
        Ok(())
    }
}
