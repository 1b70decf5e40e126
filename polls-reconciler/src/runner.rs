//! One pass of tally maintenance over the store.
//!
//! Pending tally increments are resumed first, then every targeted post's
//! tally is compared against its vote rows. Dry runs skip both writes.
use std::sync::Arc;

use polls_ledger::{ReconcileError, ReconcileSummary, TallyReconciler, VoteLedger};
use polls_repository::PollsRepository;
use polls_shared::types::PostId;
use serde_json::json;
use tracing::{error, info};

use crate::errors::ReconcilerError;

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Vote rows whose tally increment was applied by this run.
    pub resumed: usize,
    pub summary: ReconcileSummary,
}

impl RunReport {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "resumed": self.resumed,
            "posts_checked": self.summary.posts_checked,
            "drifted": self.summary.drifted,
            "corrected": self.summary.corrected,
            "failed": self.summary.failed,
            "reports": self.summary.reports,
        })
    }
}

pub struct ReconciliationRun {
    polls: Arc<dyn PollsRepository>,
    ledger: VoteLedger,
    reconciler: TallyReconciler,
    post_id: Option<PostId>,
    dry_run: bool,
}

impl ReconciliationRun {
    pub fn new(
        polls: Arc<dyn PollsRepository>,
        ledger: VoteLedger,
        reconciler: TallyReconciler,
        post_id: Option<PostId>,
        dry_run: bool,
    ) -> Self {
        Self {
            polls,
            ledger,
            reconciler,
            post_id,
            dry_run,
        }
    }

    pub async fn run(&self) -> Result<RunReport, ReconcilerError> {
        info!(post_id = ?self.post_id, dry_run = self.dry_run, "Starting tally reconciliation");

        let post_ids = match self.post_id {
            Some(post_id) => vec![post_id],
            None => self.polls.list_post_ids().await?,
        };

        let mut resumed = 0;
        if !self.dry_run {
            for post_id in &post_ids {
                match self.ledger.resume_pending_tallies(*post_id).await {
                    Ok(applied) => resumed += applied,
                    Err(e) => error!(post_id = %post_id, error = %e, "Failed to resume pending tallies"),
                }
            }
        }

        let summary = match self.post_id {
            Some(post_id) => {
                let report = self.reconciler.reconcile_post(post_id).await?;
                ReconcileSummary {
                    posts_checked: 1,
                    drifted: usize::from(report.has_drift()),
                    corrected: usize::from(report.corrected),
                    failed: 0,
                    reports: vec![report],
                }
            }
            None => self.reconciler.reconcile_all().await?,
        };

        Ok(RunReport { resumed, summary })
    }
}

/// Whether a failed single-post run only means the post is gone.
pub fn is_missing_post(error: &ReconcilerError) -> bool {
    matches!(error, ReconcilerError::Reconcile(ReconcileError::PostNotFound(_)))
}
