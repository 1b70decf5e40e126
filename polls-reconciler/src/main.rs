//! Polls Reconciler Main Entry Point
//!
//! Resumes tally increments that never landed and recomputes stored post
//! tallies from the vote ledger.

use dotenv::dotenv;
use polls_reconciler::runner::is_missing_post;
use polls_reconciler::{Dependencies, ReconcilerError, ReconcilerSettings};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing(json: bool) -> Result<(), ReconcilerError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("polls_reconciler=info,polls_ledger=info"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| ReconcilerError::Tracing(e.to_string()))?;

        info!(
            service_name = "polls-reconciler",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| ReconcilerError::Tracing(e.to_string()))?;

        info!(
            service_name = "polls-reconciler",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), ReconcilerError> {
    dotenv().ok();

    let settings = ReconcilerSettings::from_env()?;
    init_tracing(settings.json_logs)?;

    let deps = match Dependencies::new(&settings).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    match deps.run.run().await {
        Ok(report) => {
            info!(
                resumed = report.resumed,
                posts_checked = report.summary.posts_checked,
                drifted = report.summary.drifted,
                corrected = report.summary.corrected,
                failed = report.summary.failed,
                dry_run = settings.dry_run,
                "Reconciliation completed"
            );
            println!("{}", report.to_json());
            Ok(())
        }
        Err(e) if is_missing_post(&e) => {
            warn!(post_id = ?settings.post_id, "Requested post does not exist");
            Err(e)
        }
        Err(e) => {
            error!(error = %e, "Reconciliation failed");
            Err(e)
        }
    }
}
