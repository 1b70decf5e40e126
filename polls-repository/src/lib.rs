//! # Polls Repository
//! This crate provides traits and implementations for interacting with the
//! relational store behind the polls core. It includes definitions for errors,
//! interfaces, a concrete implementation for PostgreSQL, and an in-memory
//! implementation for local development and tests.
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;
pub mod types;

pub use errors::{ModerationRepositoryError, PollsRepositoryError};
pub use interfaces::{ModerationRepository, PollsRepository};
pub use memory::MemoryPollsRepository;
pub use postgres::{PostgresModerationRepository, PostgresPollsRepository, MIGRATOR};
pub use types::InsertVoteOutcome;
