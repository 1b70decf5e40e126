//! Configuration types for the vote ledger and its maintenance paths.
use std::time::Duration;

/// Configuration for the [`VoteLedger`](crate::VoteLedger), the
/// [`TallyReconciler`](crate::TallyReconciler) and post analytics.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Retries of the tally increment after a vote row is recorded.
    ///
    /// The vote row itself is never re-inserted. Defaults to 3.
    pub tally_retry_attempts: usize,

    /// Base delay of the exponential backoff between tally retries, in milliseconds.
    ///
    /// Defaults to 50.
    pub tally_retry_base_ms: u64,

    /// Upper bound on a single backoff delay.
    pub tally_retry_max_delay: Duration,

    /// How many times reconciliation re-reads a tally that changed under it.
    pub reconcile_max_attempts: usize,

    /// Report drift without overwriting stored tallies.
    pub dry_run: bool,

    /// Trailing windows for recent-activity analytics, inclusive of their lower bound.
    pub analytics_windows: Vec<chrono::Duration>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            tally_retry_attempts: 3,
            tally_retry_base_ms: 50,
            tally_retry_max_delay: Duration::from_secs(2),
            reconcile_max_attempts: 5,
            dry_run: false,
            analytics_windows: vec![chrono::Duration::hours(24), chrono::Duration::days(7)],
        }
    }
}

impl LedgerConfig {
    /// Create a config with custom tally retry settings.
    ///
    /// # Arguments
    ///
    /// * `attempts` - Retries after the first failed tally increment
    /// * `base_ms` - Base backoff delay in milliseconds
    ///
    /// # Returns
    ///
    /// A `LedgerConfig` with the given retry policy and defaults elsewhere.
    pub fn with_tally_retry(attempts: usize, base_ms: u64) -> Self {
        Self {
            tally_retry_attempts: attempts,
            tally_retry_base_ms: base_ms,
            ..Self::default()
        }
    }

    /// Create a config that only reports tally drift.
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }
}
