use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::types::{AccountId, AnonymousToken, PostId, VoterIdentity};

/// Identifier of a single vote row in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteId(pub Uuid);

impl fmt::Display for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A vote to be appended to the ledger. Carries both identity fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVote {
    pub post_id: PostId,
    pub option_index: usize,
    pub account_id: Option<AccountId>,
    pub anonymous_token: Option<AnonymousToken>,
}

impl NewVote {
    pub fn for_identity(post_id: PostId, option_index: usize, identity: &VoterIdentity) -> Self {
        Self {
            post_id,
            option_index,
            account_id: identity.account_id,
            anonymous_token: Some(identity.anonymous_token.clone()),
        }
    }
}

/// An immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub id: VoteId,
    pub post_id: PostId,
    pub option_index: usize,
    pub account_id: Option<AccountId>,
    pub anonymous_token: Option<AnonymousToken>,
    /// Whether this vote has been added to the post's cached tally.
    pub tally_applied: bool,
    pub created_at: DateTime<Utc>,
}

impl VoteRecord {
    /// Whether this row belongs to `identity`, by account id OR anonymous token.
    pub fn matches(&self, identity: &VoterIdentity) -> bool {
        let account_match = match (&self.account_id, &identity.account_id) {
            (Some(row), Some(voter)) => row == voter,
            _ => false,
        };
        let token_match = self
            .anonymous_token
            .as_ref()
            .is_some_and(|token| token == &identity.anonymous_token);
        account_match || token_match
    }
}
