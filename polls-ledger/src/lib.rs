//! # Polls Ledger
//!
//! The core of the comparison-poll system: who a voter is, whether they may
//! see a private post, whether voting is open, and recording at most one vote
//! per voter per post while keeping the post's tally in step.
//!
//! ## Components
//!
//! - [`IdentityResolver`] / [`SessionContext`]: the voter identity and its session-local state
//! - [`AccessGate`]: access-code unlocks for private posts
//! - [`window`]: the pure voting-window evaluator and the [`Clock`] it runs against
//! - [`VoteLedger`]: vote casting and tally updates
//! - [`projection`] / [`PostAnalytics`]: display figures
//! - [`TallyReconciler`]: recomputes tallies from vote rows
//! - [`PostComposer`], [`ModerationService`]: post creation and admin actions
pub mod access;
pub mod analytics;
pub mod composer;
pub mod config;
pub mod errors;
pub mod identity;
pub mod ledger;
pub mod moderation;
pub mod projection;
pub mod reconciler;
pub mod session;
pub mod window;

pub use access::{AccessDecision, AccessGate};
pub use analytics::PostAnalytics;
pub use composer::{generate_access_code, PostComposer, PostDraft};
pub use config::LedgerConfig;
pub use errors::{
    AccessError, ComposeError, LedgerError, ModerationError, PolicyRejection, ReconcileError, StoreError,
};
pub use identity::{FileStore, IdentityResolver, LocalStore, MemoryStore};
pub use ledger::{VoteLedger, VoteOutcome};
pub use moderation::ModerationService;
pub use reconciler::{ReconcileReport, ReconcileSummary, TallyReconciler};
pub use session::SessionContext;
pub use window::{evaluate, Clock, ManualClock, SystemClock};
