//! The vote ledger: at most one vote per voter per post, with the post's
//! tally kept as a best-effort cache of the recorded rows.
mod outcome;
mod vote_ledger;

pub use outcome::VoteOutcome;
pub use vote_ledger::VoteLedger;
