//! Error types for the shared domain types.
mod post_validation;

pub use post_validation::PostValidationError;
