use serde::{Deserialize, Serialize};

/// Result of a vote that passed every policy gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VoteOutcome {
    /// The vote is recorded. When this caller lost a concurrent race, the
    /// index is the winning vote's choice rather than the requested one.
    Accepted { option_index: usize },
    /// A vote already existed for this voter; nothing was written.
    AlreadyVoted { existing_option_index: usize },
}

impl VoteOutcome {
    pub fn accepted(&self) -> bool {
        matches!(self, VoteOutcome::Accepted { .. })
    }

    /// The option the ledger holds for this voter.
    pub fn option_index(&self) -> usize {
        match *self {
            VoteOutcome::Accepted { option_index } => option_index,
            VoteOutcome::AlreadyVoted {
                existing_option_index,
            } => existing_option_index,
        }
    }
}
