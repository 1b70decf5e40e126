//! PostgreSQL implementation of the polls repository.
//!
//! Provides the PostgreSQL backend for the `PollsRepository` trait.
//!
//! ## Key Features
//!
//! - Connection pooling with `sqlx::PgPool`
//! - `UNIQUE (post_id, account_id)` on `votes` as the one-vote-per-voter guard
//! - Single-statement tally increments keyed off the vote row
//! - Compare-and-set tally overwrites for reconciliation
//! - Boolean-only access code predicate
//!
//! ## Database Tables
//!
//! - `posts`: Campaigns with cached `votes[]` / `total_votes` aggregates
//! - `votes`: The append-only vote ledger
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use polls_shared::types::{
    AccountId, AnonymousToken, NewPost, NewVote, Post, PostId, PostParts, Tally, Visibility, VoteId,
    VoteRecord, VoterIdentity, VotingWindow,
};
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use crate::types::InsertVoteOutcome;
use crate::{PollsRepository, PollsRepositoryError};

const POST_COLUMNS: &str = "id, owner_id, title, images, options, votes, total_votes, is_private, \
     voting_starts_at, voting_ends_at, is_hidden, created_at";

const VOTE_COLUMNS: &str =
    "id, post_id, option_index, account_id, anonymous_token, tally_applied, created_at";

/// PostgreSQL implementation of the polls repository.
///
/// Provides database operations for posts, vote rows and tallies using
/// PostgreSQL with connection pooling.
pub struct PostgresPollsRepository {
    pool: sqlx::PgPool,
}

impl PostgresPollsRepository {
    /// Creates a new PostgreSQL repository instance.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool with required schema
    ///
    /// # Returns
    ///
    /// * `Ok(PostgresPollsRepository)` - Ready-to-use repository instance
    /// * `Err(PollsRepositoryError)` - Future validation errors (currently always succeeds)
    pub async fn new(pool: sqlx::PgPool) -> Result<Self, PollsRepositoryError> {
        Ok(Self { pool })
    }

    fn post_from_row(row: &PgRow) -> Result<Post, PollsRepositoryError> {
        let votes: Vec<Option<i32>> = row.try_get("votes")?;
        let total_votes: i32 = row.try_get("total_votes")?;
        let is_private: bool = row.try_get("is_private")?;
        let starts_at: Option<DateTime<Utc>> = row.try_get("voting_starts_at")?;
        let ends_at: Option<DateTime<Utc>> = row.try_get("voting_ends_at")?;

        let parts = PostParts {
            id: PostId::new(row.try_get("id")?),
            owner_id: AccountId::new(row.try_get("owner_id")?),
            title: row.try_get("title")?,
            images: row.try_get("images")?,
            options: row.try_get("options")?,
            // Gaps left by out-of-range subscripts read back as NULL.
            votes: votes.into_iter().map(|v| i64::from(v.unwrap_or(0))).collect(),
            total_votes: i64::from(total_votes),
            visibility: if is_private {
                Visibility::Private
            } else {
                Visibility::Public
            },
            window: VotingWindow::new(starts_at, ends_at)?,
            hidden: row.try_get("is_hidden")?,
            created_at: row.try_get("created_at")?,
        };

        Ok(Post::from_parts(parts)?)
    }

    fn vote_from_row(row: &PgRow) -> Result<VoteRecord, PollsRepositoryError> {
        let option_index: i32 = row.try_get("option_index")?;
        let account_id: Option<Uuid> = row.try_get("account_id")?;
        let anonymous_token: Option<String> = row.try_get("anonymous_token")?;

        Ok(VoteRecord {
            id: VoteId(row.try_get("id")?),
            post_id: PostId::new(row.try_get("post_id")?),
            option_index: usize::try_from(option_index)
                .map_err(|_| PollsRepositoryError::InvalidOptionIndex(i64::from(option_index)))?,
            account_id: account_id.map(AccountId::new),
            anonymous_token: anonymous_token.map(AnonymousToken::new),
            tally_applied: row.try_get("tally_applied")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn to_db_counts(tally: &Tally) -> Result<Vec<i32>, PollsRepositoryError> {
        tally
            .counts()
            .iter()
            .map(|c| i32::try_from(*c).map_err(|_| PollsRepositoryError::InvalidVote(format!("count {} out of range", c))))
            .collect()
    }

    fn to_db_total(tally: &Tally) -> Result<i32, PollsRepositoryError> {
        i32::try_from(tally.total())
            .map_err(|_| PollsRepositoryError::InvalidVote(format!("total {} out of range", tally.total())))
    }
}

#[async_trait]
impl PollsRepository for PostgresPollsRepository {
    async fn create_post(&self, post: &NewPost) -> Result<Post, PollsRepositoryError> {
        let zeroed = vec![0i32; post.images.len()];
        let query = format!(
            "INSERT INTO posts (id, owner_id, title, images, options, votes, total_votes, is_private, \
             access_code, voting_starts_at, voting_ends_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $8, $9, $10) \
             RETURNING {}",
            POST_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(post.owner_id.as_uuid())
            .bind(&post.title)
            .bind(&post.images)
            .bind(&post.options)
            .bind(&zeroed)
            .bind(post.visibility() == Visibility::Private)
            .bind(post.access_code.as_ref().map(|c| c.as_str().to_string()))
            .bind(post.window.starts_at)
            .bind(post.window.ends_at)
            .fetch_one(&self.pool)
            .await?;

        Self::post_from_row(&row)
    }

    async fn get_post(&self, post_id: PostId) -> Result<Option<Post>, PollsRepositoryError> {
        let query = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);
        let row = sqlx::query(&query)
            .bind(post_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::post_from_row).transpose()
    }

    async fn list_post_ids(&self) -> Result<Vec<PostId>, PollsRepositoryError> {
        let rows = sqlx::query("SELECT id FROM posts ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<PostId, PollsRepositoryError> {
                Ok(PostId::new(row.try_get("id")?))
            })
            .collect()
    }

    async fn find_vote(
        &self,
        post_id: PostId,
        identity: &VoterIdentity,
    ) -> Result<Option<VoteRecord>, PollsRepositoryError> {
        // A NULL account id compares as unknown, so anonymous voters only match on token.
        let query = format!(
            "SELECT {} FROM votes \
             WHERE post_id = $1 AND (account_id = $2 OR anonymous_token = $3) \
             ORDER BY created_at ASC LIMIT 1",
            VOTE_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(post_id.as_uuid())
            .bind(identity.account_id.map(|a| a.0))
            .bind(identity.anonymous_token.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::vote_from_row).transpose()
    }

    async fn insert_vote(&self, vote: &NewVote) -> Result<InsertVoteOutcome, PollsRepositoryError> {
        let option_index = i32::try_from(vote.option_index)
            .map_err(|_| PollsRepositoryError::InvalidOptionIndex(vote.option_index as i64))?;
        let query = format!(
            "INSERT INTO votes (id, post_id, option_index, account_id, anonymous_token) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            VOTE_COLUMNS
        );

        let result = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(vote.post_id.as_uuid())
            .bind(option_index)
            .bind(vote.account_id.map(|a| a.0))
            .bind(vote.anonymous_token.as_ref().map(|t| t.as_str().to_string()))
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => Ok(InsertVoteOutcome::Inserted(Self::vote_from_row(&row)?)),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                debug!(post_id = %vote.post_id, "Vote insert hit uniqueness constraint");
                Ok(InsertVoteOutcome::Conflict)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn apply_vote_to_tally(&self, vote_id: VoteId) -> Result<bool, PollsRepositoryError> {
        // Flipping the flag and incrementing happen in one statement, so a retry
        // after an ambiguous failure can never count the same row twice.
        let applied = sqlx::query(
            r#"
            WITH applied AS (
                UPDATE votes SET tally_applied = TRUE
                WHERE id = $1 AND tally_applied = FALSE
                RETURNING post_id, option_index
            )
            UPDATE posts
            SET votes[applied.option_index + 1] = COALESCE(posts.votes[applied.option_index + 1], 0) + 1,
                total_votes = posts.total_votes + 1
            FROM applied
            WHERE posts.id = applied.post_id
            RETURNING posts.id
            "#,
        )
        .bind(vote_id.0)
        .fetch_optional(&self.pool)
        .await?;

        Ok(applied.is_some())
    }

    async fn list_votes(&self, post_id: PostId) -> Result<Vec<VoteRecord>, PollsRepositoryError> {
        let query = format!(
            "SELECT {} FROM votes WHERE post_id = $1 ORDER BY created_at ASC",
            VOTE_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(post_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::vote_from_row).collect()
    }

    async fn compare_and_set_tally(
        &self,
        post_id: PostId,
        expected: &Tally,
        replacement: &Tally,
    ) -> Result<bool, PollsRepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET votes = $2, total_votes = $3
            WHERE id = $1
              AND ARRAY(
                  SELECT COALESCE(t.v, 0)
                  FROM UNNEST(posts.votes) WITH ORDINALITY AS t(v, i)
                  ORDER BY t.i
              ) = $4
              AND total_votes = $5
            "#,
        )
        .bind(post_id.as_uuid())
        .bind(Self::to_db_counts(replacement)?)
        .bind(Self::to_db_total(replacement)?)
        .bind(Self::to_db_counts(expected)?)
        .bind(Self::to_db_total(expected)?)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn access_code_matches(
        &self,
        post_id: PostId,
        attempt: &str,
    ) -> Result<bool, PollsRepositoryError> {
        let matches: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM posts
                WHERE id = $1 AND is_private AND access_code = UPPER(TRIM($2))
            )
            "#,
        )
        .bind(post_id.as_uuid())
        .bind(attempt)
        .fetch_one(&self.pool)
        .await?;

        Ok(matches)
    }
}
