//! Derives the effective voter identity of this device.
use std::sync::{Arc, PoisonError, RwLock};

use polls_shared::types::{AccountId, AnonymousToken, VoterIdentity};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::identity::LocalStore;
use crate::session::SessionContext;

/// Storage key of the durable anonymous token.
pub const ANONYMOUS_TOKEN_KEY: &str = "anonymous_token";

const TOKEN_PREFIX: &str = "anon_";
const TOKEN_LEN: usize = 13;
const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a fresh anonymous token: `anon_` and 13 lowercase base-36 characters.
pub fn generate_anonymous_token() -> AnonymousToken {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect();
    AnonymousToken::new(format!("{TOKEN_PREFIX}{suffix}"))
}

/// Resolves `{ anonymous token, account id? }` for this device.
///
/// The anonymous token is created on first use and persisted in the local
/// store. The account id comes from the identity provider via [`sign_in`].
/// Resolution never fails: when the store cannot be read or written the
/// resolver hands out an ephemeral token for that call.
///
/// [`sign_in`]: IdentityResolver::sign_in
pub struct IdentityResolver {
    store: Arc<dyn LocalStore>,
    account_id: RwLock<Option<AccountId>>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self {
            store,
            account_id: RwLock::new(None),
        }
    }

    /// Record the account id of a session established with the identity provider.
    pub fn sign_in(&self, account_id: AccountId) {
        *self.account_id.write().unwrap_or_else(PoisonError::into_inner) = Some(account_id);
        info!(account_id = %account_id, "Signed in");
    }

    /// Drop the account id. The anonymous token is kept.
    pub fn sign_out(&self) {
        *self.account_id.write().unwrap_or_else(PoisonError::into_inner) = None;
        info!("Signed out");
    }

    /// The current voter identity.
    pub fn resolve(&self) -> VoterIdentity {
        let token = self.anonymous_token();
        match *self.account_id.read().unwrap_or_else(PoisonError::into_inner) {
            Some(account_id) => VoterIdentity::authenticated(token, account_id),
            None => VoterIdentity::anonymous(token),
        }
    }

    /// A fresh session for the current identity, sharing this resolver's store.
    ///
    /// Start a new session whenever the identity changes; unlock flags do not
    /// carry over.
    pub fn session(&self) -> SessionContext {
        SessionContext::new(self.resolve(), Arc::clone(&self.store))
    }

    fn anonymous_token(&self) -> AnonymousToken {
        match self.store.get(ANONYMOUS_TOKEN_KEY) {
            Ok(Some(token)) if token.starts_with(TOKEN_PREFIX) => return AnonymousToken::new(token),
            Ok(Some(token)) => {
                warn!(token = %token, "Stored anonymous token is malformed, replacing it");
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Local storage unavailable, using an ephemeral anonymous token");
                return generate_anonymous_token();
            }
        }

        let token = generate_anonymous_token();
        if let Err(e) = self.store.set(ANONYMOUS_TOKEN_KEY, token.as_str()) {
            warn!(error = %e, "Could not persist anonymous token, using it ephemerally");
        } else {
            debug!(token = %token, "Created anonymous token");
        }
        token
    }
}
