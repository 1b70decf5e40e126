//! PostgreSQL implementations of the polls repositories.
mod moderation_repository;
mod polls_repository;

pub use moderation_repository::PostgresModerationRepository;
pub use polls_repository::PostgresPollsRepository;

/// Embedded schema migrations for the `posts`, `votes` and `banned_accounts` tables.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("src/postgres/migrations");
