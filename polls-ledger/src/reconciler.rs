//! Offline recomputation of stored tallies from the vote ledger.
//!
//! A post's tally is a cache over its vote rows and can drift, for example
//! after a manual data fix. Only rows whose increment was applied are counted;
//! rows still pending belong to [`VoteLedger::resume_pending_tallies`].
//! Overwrites are compare-and-set against the tally read at the start of a
//! pass, so a concurrent increment makes the pass start over instead of being
//! lost.
//!
//! [`VoteLedger::resume_pending_tallies`]: crate::VoteLedger::resume_pending_tallies
use std::sync::Arc;

use polls_repository::PollsRepository;
use polls_shared::types::{PostId, Tally};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::LedgerConfig;
use crate::errors::ReconcileError;

/// What reconciliation found for one post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub post_id: PostId,
    pub before: Tally,
    pub after: Tally,
    /// Vote rows whose tally increment has not been applied yet.
    pub pending_votes: usize,
    /// Whether the stored tally was overwritten.
    pub corrected: bool,
}

impl ReconcileReport {
    pub fn has_drift(&self) -> bool {
        self.before != self.after
    }
}

/// Totals of a reconciliation pass over every post.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileSummary {
    pub posts_checked: usize,
    pub drifted: usize,
    pub corrected: usize,
    pub failed: usize,
    pub reports: Vec<ReconcileReport>,
}

pub struct TallyReconciler {
    polls: Arc<dyn PollsRepository>,
    config: LedgerConfig,
}

impl TallyReconciler {
    pub fn new(polls: Arc<dyn PollsRepository>, config: LedgerConfig) -> Self {
        Self { polls, config }
    }

    /// Recompute one post's tally and overwrite it when it drifted.
    ///
    /// In dry-run mode drift is reported but nothing is written.
    pub async fn reconcile_post(&self, post_id: PostId) -> Result<ReconcileReport, ReconcileError> {
        let attempts = self.config.reconcile_max_attempts.max(1);

        for attempt in 1..=attempts {
            let post = self
                .polls
                .get_post(post_id)
                .await?
                .ok_or(ReconcileError::PostNotFound(post_id))?;
            let before = post.tally().clone();
            let votes = self.polls.list_votes(post_id).await?;

            let pending_votes = votes.iter().filter(|vote| !vote.tally_applied).count();
            let width = before.counts().len().max(post.option_count());
            let after = Tally::from_option_indices(
                width,
                votes
                    .iter()
                    .filter(|vote| vote.tally_applied)
                    .map(|vote| vote.option_index),
            );

            let mut report = ReconcileReport {
                post_id,
                before,
                after,
                pending_votes,
                corrected: false,
            };
            if !report.has_drift() {
                debug!(post_id = %post_id, pending_votes, "Tally matches the ledger");
                return Ok(report);
            }

            warn!(
                post_id = %post_id,
                stored = ?report.before.counts(),
                stored_total = report.before.total(),
                recomputed = ?report.after.counts(),
                recomputed_total = report.after.total(),
                "Tally drift detected"
            );
            if self.config.dry_run {
                return Ok(report);
            }

            if self
                .polls
                .compare_and_set_tally(post_id, &report.before, &report.after)
                .await?
            {
                report.corrected = true;
                info!(
                    post_id = %post_id,
                    total = report.after.total(),
                    "Tally corrected from the vote ledger"
                );
                return Ok(report);
            }

            debug!(post_id = %post_id, attempt, "Tally changed during reconciliation, retrying");
        }

        Err(ReconcileError::Contended { post_id, attempts })
    }

    /// Reconcile every post, continuing past per-post failures.
    pub async fn reconcile_all(&self) -> Result<ReconcileSummary, ReconcileError> {
        let mut summary = ReconcileSummary::default();

        for post_id in self.polls.list_post_ids().await? {
            summary.posts_checked += 1;
            match self.reconcile_post(post_id).await {
                Ok(report) => {
                    if report.has_drift() {
                        summary.drifted += 1;
                    }
                    if report.corrected {
                        summary.corrected += 1;
                    }
                    summary.reports.push(report);
                }
                // Deleted between listing and reconciling.
                Err(ReconcileError::PostNotFound(_)) => {
                    summary.posts_checked -= 1;
                }
                Err(e) => {
                    error!(post_id = %post_id, error = %e, "Failed to reconcile tally");
                    summary.failed += 1;
                }
            }
        }

        info!(
            posts_checked = summary.posts_checked,
            drifted = summary.drifted,
            corrected = summary.corrected,
            failed = summary.failed,
            "Reconciliation finished"
        );
        Ok(summary)
    }
}
