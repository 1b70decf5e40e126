//! Error types for the polls core.
//! Consolidates and re-exports the error types of each component.
mod access;
mod compose;
mod ledger;
mod moderation;
mod reconcile;
mod store;

pub use access::AccessError;
pub use compose::ComposeError;
pub use ledger::{LedgerError, PolicyRejection};
pub use moderation::ModerationError;
pub use reconcile::ReconcileError;
pub use store::StoreError;
