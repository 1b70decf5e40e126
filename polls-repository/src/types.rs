//! Result types for ledger operations against the store.
use polls_shared::types::VoteRecord;

/// Outcome of appending a vote row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertVoteOutcome {
    /// The row was durably inserted.
    Inserted(VoteRecord),
    /// The `(post, account)` uniqueness constraint fired; another row already exists.
    Conflict,
}
