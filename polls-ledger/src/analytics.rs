//! Per-post analytics computed from the vote rows rather than the cached tally.
use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use polls_repository::{PollsRepository, PollsRepositoryError};
use polls_shared::types::{Post, PostId, Tally, VoteRecord};
use serde::Serialize;

use crate::projection::percentage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionShare {
    pub option_index: usize,
    pub votes: i64,
    pub percentage: u32,
}

/// Votes cast within a trailing window ending at the evaluation instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentActivity {
    pub window_seconds: i64,
    pub votes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostAnalytics {
    pub post_id: PostId,
    pub distribution: Vec<OptionShare>,
    pub total_votes: i64,
    /// Distinct signed-in voters, or the stored total when no row carries an account.
    pub unique_voters: i64,
    pub recent: Vec<RecentActivity>,
    pub first_vote_at: Option<DateTime<Utc>>,
    pub last_vote_at: Option<DateTime<Utc>>,
}

impl PostAnalytics {
    /// Compute analytics for `post` from its vote rows as of `now`.
    pub fn compute(post: &Post, votes: &[VoteRecord], now: DateTime<Utc>, windows: &[Duration]) -> Self {
        let tally = Tally::from_option_indices(post.option_count(), votes.iter().map(|v| v.option_index));
        let total_votes = tally.total();

        let distribution = tally
            .counts()
            .iter()
            .enumerate()
            .map(|(option_index, count)| OptionShare {
                option_index,
                votes: *count,
                percentage: percentage(*count, total_votes),
            })
            .collect();

        let accounts: HashSet<_> = votes.iter().filter_map(|v| v.account_id).collect();
        let unique_voters = if accounts.is_empty() {
            post.tally().total()
        } else {
            accounts.len() as i64
        };

        let recent = windows
            .iter()
            .map(|window| {
                let since = now - *window;
                RecentActivity {
                    window_seconds: window.num_seconds(),
                    votes: votes.iter().filter(|v| v.created_at >= since).count(),
                }
            })
            .collect();

        Self {
            post_id: post.id(),
            distribution,
            total_votes,
            unique_voters,
            recent,
            first_vote_at: votes.iter().map(|v| v.created_at).min(),
            last_vote_at: votes.iter().map(|v| v.created_at).max(),
        }
    }

    /// Load a post and its votes and compute analytics, or `None` when the post does not exist.
    pub async fn load(
        polls: &dyn PollsRepository,
        post_id: PostId,
        now: DateTime<Utc>,
        windows: &[Duration],
    ) -> Result<Option<Self>, PollsRepositoryError> {
        let Some(post) = polls.get_post(post_id).await? else {
            return Ok(None);
        };
        let votes = polls.list_votes(post_id).await?;
        Ok(Some(Self::compute(&post, &votes, now, windows)))
    }
}
