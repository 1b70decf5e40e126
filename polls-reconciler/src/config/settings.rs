use std::env;

use polls_shared::types::PostId;
use uuid::Uuid;

use crate::errors::ReconcilerError;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Settings of one reconciliation run, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerSettings {
    pub database_url: String,
    pub max_connections: u32,
    /// Reconcile only this post instead of every post.
    pub post_id: Option<PostId>,
    pub dry_run: bool,
    pub json_logs: bool,
}

impl ReconcilerSettings {
    /// Reads `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS`, `RECONCILE_POST_ID`,
    /// `RECONCILE_DRY_RUN` and `LOG_FORMAT`.
    ///
    /// # Panics
    ///
    /// When `DATABASE_URL` is not set.
    pub fn from_env() -> Result<Self, ReconcilerError> {
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(value) => value.trim().parse().map_err(|_| {
                ReconcilerError::InvalidConfig(format!(
                    "DATABASE_MAX_CONNECTIONS must be a positive integer, got {value:?}"
                ))
            })?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };
        if max_connections == 0 {
            return Err(ReconcilerError::InvalidConfig(
                "DATABASE_MAX_CONNECTIONS must be a positive integer, got 0".to_string(),
            ));
        }

        let post_id = match env::var("RECONCILE_POST_ID") {
            Ok(value) if !value.trim().is_empty() => Some(PostId::new(
                Uuid::parse_str(value.trim()).map_err(|e| {
                    ReconcilerError::InvalidConfig(format!("RECONCILE_POST_ID is not a UUID: {e}"))
                })?,
            )),
            _ => None,
        };

        let dry_run = match env::var("RECONCILE_DRY_RUN") {
            Ok(value) => parse_flag("RECONCILE_DRY_RUN", &value)?,
            Err(_) => false,
        };

        let json_logs = env::var("LOG_FORMAT")
            .map(|value| value.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            database_url,
            max_connections,
            post_id,
            dry_run,
            json_logs,
        })
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ReconcilerError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "" | "0" | "false" | "no" => Ok(false),
        other => Err(ReconcilerError::InvalidConfig(format!(
            "{name} must be true or false, got {other:?}"
        ))),
    }
}
