//! Configuration module for the Polls Reconciler.
//! Reads settings from the environment and wires up the store and ledger.
mod dependencies;
mod settings;

pub use dependencies::Dependencies;
pub use settings::ReconcilerSettings;
