use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable, globally unique account identifier issued by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque per-device token used as a secondary de-duplication key.
///
/// Not unique across devices or browsers and never expires.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnonymousToken(String);

impl AnonymousToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnonymousToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The effective identity of a voter.
///
/// The anonymous token is always present; the account id appears once the
/// voter signs in and the token is retained afterwards for continuity matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterIdentity {
    pub anonymous_token: AnonymousToken,
    pub account_id: Option<AccountId>,
}

impl VoterIdentity {
    pub fn anonymous(anonymous_token: AnonymousToken) -> Self {
        Self {
            anonymous_token,
            account_id: None,
        }
    }

    pub fn authenticated(anonymous_token: AnonymousToken, account_id: AccountId) -> Self {
        Self {
            anonymous_token,
            account_id: Some(account_id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.account_id.is_some()
    }
}
