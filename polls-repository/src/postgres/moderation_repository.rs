//! PostgreSQL implementation of the moderation repository.
//!
//! Hides and deletes posts in the `posts` table and records bans in `banned_accounts`.

use async_trait::async_trait;
use polls_shared::types::{AccountId, PostId};

use crate::errors::ModerationRepositoryError;
use crate::ModerationRepository;

/// PostgreSQL-backed moderation repository.
pub struct PostgresModerationRepository {
    /// PostgreSQL connection pool
    pool: sqlx::PgPool,
}

impl PostgresModerationRepository {
    /// Creates a new PostgreSQL moderation repository instance.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool with required schema
    pub async fn new(pool: sqlx::PgPool) -> Result<Self, ModerationRepositoryError> {
        Ok(Self { pool })
    }
}

#[async_trait]
impl ModerationRepository for PostgresModerationRepository {
    async fn set_post_hidden(&self, post_id: PostId, hidden: bool) -> Result<bool, ModerationRepositoryError> {
        let result = sqlx::query("UPDATE posts SET is_hidden = $2 WHERE id = $1")
            .bind(post_id.as_uuid())
            .bind(hidden)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_post(&self, post_id: PostId) -> Result<bool, ModerationRepositoryError> {
        // Vote rows go with the post through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_account_banned(&self, account_id: AccountId, banned: bool) -> Result<(), ModerationRepositoryError> {
        if banned {
            sqlx::query("INSERT INTO banned_accounts (account_id) VALUES ($1) ON CONFLICT (account_id) DO NOTHING")
                .bind(account_id.as_uuid())
                .execute(&self.pool)
                .await?;
        } else {
            sqlx::query("DELETE FROM banned_accounts WHERE account_id = $1")
                .bind(account_id.as_uuid())
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    async fn is_account_banned(&self, account_id: AccountId) -> Result<bool, ModerationRepositoryError> {
        let banned: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM banned_accounts WHERE account_id = $1)",
        )
        .bind(account_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(banned)
    }
}
