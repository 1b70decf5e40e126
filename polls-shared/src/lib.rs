//! # Polls Shared
//! This crate defines the domain types used across the polls workspace.
//! It includes voter identities, posts with their tallies and voting windows,
//! access codes, and individual vote records.
//!
//! Posts are validated once when they are constructed (after a fetch or at
//! creation time) so downstream code never re-infers their shape.
pub mod errors;
pub mod types;

pub use errors::PostValidationError;
