//! Polls Reconciler Library
//!
//! Configuration, dependency wiring and the reconciliation run used by the
//! `polls-reconciler` binary.

pub mod config;
pub mod errors;
pub mod runner;

pub use config::{Dependencies, ReconcilerSettings};
pub use errors::ReconcilerError;
pub use runner::{ReconciliationRun, RunReport};
