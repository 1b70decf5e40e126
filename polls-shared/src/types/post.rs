use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::PostValidationError;
use crate::types::{AccessCode, AccountId, Tally, VotingWindow};

/// Fewest images a stored post may carry.
pub const MIN_IMAGES: usize = 1;
/// Most images a stored post may carry.
pub const MAX_IMAGES: usize = 3;

/// Identifier of a post (voting campaign).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PostId(pub Uuid);

impl PostId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Who may see a post's results and vote on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    /// Gated by an access code held by the store, never by the post value.
    Private,
}

/// A post ready to be written by its owner, already validated by the composer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub owner_id: AccountId,
    pub title: String,
    pub images: Vec<String>,
    pub options: Vec<String>,
    /// `Some` makes the post private.
    pub access_code: Option<AccessCode>,
    pub window: VotingWindow,
}

impl NewPost {
    pub fn visibility(&self) -> Visibility {
        if self.access_code.is_some() {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }
}

/// Raw fields of a post as read from the store, before validation.
#[derive(Debug, Clone)]
pub struct PostParts {
    pub id: PostId,
    pub owner_id: AccountId,
    pub title: String,
    pub images: Vec<String>,
    pub options: Vec<String>,
    pub votes: Vec<i64>,
    pub total_votes: i64,
    pub visibility: Visibility,
    pub window: VotingWindow,
    pub hidden: bool,
    pub created_at: DateTime<Utc>,
}

/// A validated post.
///
/// Constructed once at the system boundary via [`Post::from_parts`]; the
/// image/option/tally shape is guaranteed from then on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    id: PostId,
    owner_id: AccountId,
    title: String,
    images: Vec<String>,
    options: Vec<String>,
    tally: Tally,
    visibility: Visibility,
    window: VotingWindow,
    hidden: bool,
    created_at: DateTime<Utc>,
}

impl Post {
    pub fn from_parts(parts: PostParts) -> Result<Self, PostValidationError> {
        let image_count = parts.images.len();
        if !(MIN_IMAGES..=MAX_IMAGES).contains(&image_count) {
            return Err(PostValidationError::ImageCount {
                provided: image_count,
                min: MIN_IMAGES,
                max: MAX_IMAGES,
            });
        }
        if parts.options.len() != image_count {
            return Err(PostValidationError::OptionCount {
                provided: parts.options.len(),
                expected: image_count,
            });
        }
        if parts.votes.len() < parts.options.len() {
            return Err(PostValidationError::TallyTooShort {
                provided: parts.votes.len(),
                options: parts.options.len(),
            });
        }
        let tally = Tally::new(parts.votes, parts.total_votes)?;

        Ok(Self {
            id: parts.id,
            owner_id: parts.owner_id,
            title: parts.title,
            images: parts.images,
            options: parts.options,
            tally,
            visibility: parts.visibility,
            window: parts.window,
            hidden: parts.hidden,
            created_at: parts.created_at,
        })
    }

    pub fn id(&self) -> PostId {
        self.id
    }

    pub fn owner_id(&self) -> AccountId {
        self.owner_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    pub fn has_option(&self, option_index: usize) -> bool {
        option_index < self.options.len()
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    pub fn window(&self) -> &VotingWindow {
        &self.window
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
