//! Per-session voter context passed explicitly into the ledger and access gate.
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use polls_shared::types::{PostId, VoterIdentity};
use tracing::{debug, warn};

use crate::identity::LocalStore;

/// Storage key of the advisory vote cache for one post.
pub fn vote_cache_key(post_id: PostId) -> String {
    format!("vote_{post_id}")
}

/// The resolved identity of one viewing session together with its local state.
///
/// Unlock flags live only as long as this value. The per-post vote cache is
/// written through to the device store and is advisory: it speeds up display
/// but never authorizes anything.
pub struct SessionContext {
    identity: VoterIdentity,
    store: Arc<dyn LocalStore>,
    unlocked: RwLock<HashSet<PostId>>,
}

impl SessionContext {
    pub fn new(identity: VoterIdentity, store: Arc<dyn LocalStore>) -> Self {
        Self {
            identity,
            store,
            unlocked: RwLock::new(HashSet::new()),
        }
    }

    pub fn identity(&self) -> &VoterIdentity {
        &self.identity
    }

    pub fn is_unlocked(&self, post_id: PostId) -> bool {
        self.unlocked
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&post_id)
    }

    pub fn mark_unlocked(&self, post_id: PostId) {
        self.unlocked
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(post_id);
    }

    /// The locally cached option index for a post, if any.
    pub fn cached_vote(&self, post_id: PostId) -> Option<usize> {
        match self.store.get(&vote_cache_key(post_id)) {
            Ok(Some(value)) => match value.parse() {
                Ok(option_index) => Some(option_index),
                Err(_) => {
                    debug!(post_id = %post_id, value = %value, "Ignoring unreadable cached vote");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                debug!(post_id = %post_id, error = %e, "Vote cache unavailable");
                None
            }
        }
    }

    /// Remember the option the ledger holds for this voter.
    pub fn record_vote(&self, post_id: PostId, option_index: usize) {
        if let Err(e) = self
            .store
            .set(&vote_cache_key(post_id), &option_index.to_string())
        {
            warn!(post_id = %post_id, error = %e, "Could not cache vote locally");
        }
    }

    pub fn forget_vote(&self, post_id: PostId) {
        if let Err(e) = self.store.remove(&vote_cache_key(post_id)) {
            warn!(post_id = %post_id, error = %e, "Could not clear cached vote");
        }
    }
}
