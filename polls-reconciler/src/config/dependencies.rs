use std::sync::Arc;

use polls_ledger::{LedgerConfig, SystemClock, TallyReconciler, VoteLedger};
use polls_repository::{
    PollsRepository, PostgresModerationRepository, PostgresPollsRepository, MIGRATOR,
};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::ReconcilerSettings;
use crate::errors::ReconcilerError;
use crate::runner::ReconciliationRun;

/// `Dependencies` holds the components a reconciliation run needs.
pub struct Dependencies {
    pub run: ReconciliationRun,
}

impl Dependencies {
    /// Connects to PostgreSQL, applies pending migrations and wires the ledger
    /// and reconciler onto the pool.
    ///
    /// # Returns
    ///
    /// A `Result` which is `Ok(Self)` on successful initialization or a
    /// `ReconcilerError` if the database cannot be reached or migrated.
    pub async fn new(settings: &ReconcilerSettings) -> Result<Self, ReconcilerError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect(&settings.database_url)
            .await?;
        MIGRATOR.run(&pool).await?;
        info!(max_connections = settings.max_connections, "Database ready");

        let polls: Arc<dyn PollsRepository> = Arc::new(PostgresPollsRepository::new(pool.clone()).await?);
        let moderation = Arc::new(PostgresModerationRepository::new(pool).await?);

        let config = LedgerConfig {
            dry_run: settings.dry_run,
            ..LedgerConfig::default()
        };
        let ledger = VoteLedger::with_config(
            Arc::clone(&polls),
            moderation,
            Arc::new(SystemClock),
            config.clone(),
        );
        let reconciler = TallyReconciler::new(Arc::clone(&polls), config);

        Ok(Self {
            run: ReconciliationRun::new(polls, ledger, reconciler, settings.post_id, settings.dry_run),
        })
    }
}
