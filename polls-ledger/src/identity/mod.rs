//! Voter identity: device-local storage and the resolver built on it.
mod resolver;
mod store;

pub use resolver::{generate_anonymous_token, IdentityResolver, ANONYMOUS_TOKEN_KEY};
pub use store::{FileStore, LocalStore, MemoryStore};
