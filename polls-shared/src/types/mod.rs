mod access_code;
mod identity;
mod post;
mod tally;
mod vote;
mod window;

pub use access_code::{AccessCode, ACCESS_CODE_MAX_LEN};
pub use identity::{AccountId, AnonymousToken, VoterIdentity};
pub use post::{NewPost, Post, PostId, PostParts, Visibility, MAX_IMAGES, MIN_IMAGES};
pub use tally::Tally;
pub use vote::{NewVote, VoteId, VoteRecord};
pub use window::{VotingWindow, WindowState};
