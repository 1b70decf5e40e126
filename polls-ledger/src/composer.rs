//! Post creation boundary: turns an owner's draft into a validated `NewPost`.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use polls_repository::PollsRepository;
use polls_shared::types::{AccessCode, NewPost, Post, VoterIdentity, VotingWindow};
use rand::Rng;
use serde::Deserialize;
use tracing::info;

use crate::errors::ComposeError;

pub const MIN_COMPARISON_IMAGES: usize = 2;
pub const MAX_COMPARISON_IMAGES: usize = 3;
pub const MAX_LABEL_LEN: usize = 15;
pub const MAX_TITLE_LEN: usize = 70;

const ACCESS_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const GENERATED_CODE_LEN: usize = 6;

/// A six-character access code without look-alike characters (no 0/O, 1/I).
pub fn generate_access_code() -> String {
    let mut rng = rand::thread_rng();
    (0..GENERATED_CODE_LEN)
        .map(|_| ACCESS_CODE_ALPHABET[rng.gen_range(0..ACCESS_CODE_ALPHABET.len())] as char)
        .collect()
}

/// What an owner submits when creating a post.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostDraft {
    #[serde(default)]
    pub title: String,
    /// Public URLs of already uploaded images, in display order.
    pub images: Vec<String>,
    /// Labels by image position; blank or missing labels get a default.
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub access_code: Option<String>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

pub struct PostComposer {
    polls: Arc<dyn PollsRepository>,
}

impl PostComposer {
    pub fn new(polls: Arc<dyn PollsRepository>) -> Self {
        Self { polls }
    }

    /// Validate a draft and store it as a new post with a zeroed tally.
    pub async fn create(&self, draft: &PostDraft, owner: &VoterIdentity) -> Result<Post, ComposeError> {
        let new_post = compose(draft, owner)?;
        let post = self.polls.create_post(&new_post).await?;
        info!(
            post_id = %post.id(),
            owner_id = %post.owner_id(),
            options = post.option_count(),
            private = post.is_private(),
            "Post created"
        );
        Ok(post)
    }
}

/// Validate a draft into a `NewPost` without touching the store.
pub fn compose(draft: &PostDraft, owner: &VoterIdentity) -> Result<NewPost, ComposeError> {
    let owner_id = owner.account_id.ok_or(ComposeError::NotAuthenticated)?;

    let images: Vec<String> = draft.images.iter().map(|image| image.trim().to_string()).collect();
    if !(MIN_COMPARISON_IMAGES..=MAX_COMPARISON_IMAGES).contains(&images.len()) {
        return Err(ComposeError::ImageCount {
            provided: images.len(),
            min: MIN_COMPARISON_IMAGES,
            max: MAX_COMPARISON_IMAGES,
        });
    }
    if let Some(index) = images.iter().position(|image| image.is_empty()) {
        return Err(ComposeError::EmptyImage { index });
    }

    let options = option_labels(&draft.labels, images.len())?;
    let title = match draft.title.trim() {
        "" => options.join(" or "),
        title if title.chars().count() > MAX_TITLE_LEN => {
            return Err(ComposeError::TitleTooLong { max: MAX_TITLE_LEN })
        }
        title => title.to_string(),
    };

    let access_code = if draft.private {
        match draft.access_code.as_deref().map(str::trim) {
            None | Some("") => return Err(ComposeError::MissingAccessCode),
            Some(code) => Some(AccessCode::parse(code)?),
        }
    } else {
        None
    };

    let window = match (draft.starts_at, draft.ends_at) {
        (None, None) => VotingWindow::always_open(),
        (Some(starts_at), Some(ends_at)) => VotingWindow::new(Some(starts_at), Some(ends_at))?,
        _ => return Err(ComposeError::IncompleteWindow),
    };

    Ok(NewPost {
        owner_id,
        title,
        images,
        options,
        access_code,
        window,
    })
}

fn option_labels(labels: &[String], images: usize) -> Result<Vec<String>, ComposeError> {
    if labels.len() > images {
        return Err(ComposeError::TooManyLabels {
            provided: labels.len(),
            images,
        });
    }

    (0..images)
        .map(|index| {
            let label = labels.get(index).map(|l| l.trim()).unwrap_or("");
            if label.is_empty() {
                Ok(format!("Option {}", (b'A' + index as u8) as char))
            } else if label.chars().count() > MAX_LABEL_LEN {
                Err(ComposeError::LabelTooLong {
                    index,
                    max: MAX_LABEL_LEN,
                })
            } else {
                Ok(label.to_string())
            }
        })
        .collect()
}
