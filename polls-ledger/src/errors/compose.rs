//! Error types for post composition.
use polls_repository::PollsRepositoryError;
use polls_shared::PostValidationError;
use thiserror::Error;

/// Represents the reasons a post draft can be refused before it is stored.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Only signed-in accounts can create posts")]
    NotAuthenticated,

    #[error("A comparison needs between {min} and {max} images, got {provided}")]
    ImageCount {
        provided: usize,
        min: usize,
        max: usize,
    },

    #[error("Image {index} has an empty reference")]
    EmptyImage { index: usize },

    #[error("Got {provided} labels for {images} images")]
    TooManyLabels { provided: usize, images: usize },

    #[error("Label {index} is longer than {max} characters")]
    LabelTooLong { index: usize, max: usize },

    #[error("Title is longer than {max} characters")]
    TitleTooLong { max: usize },

    #[error("Private posts need an access code")]
    MissingAccessCode,

    #[error("Timed voting needs both a start and an end")]
    IncompleteWindow,

    #[error("Invalid post: {0}")]
    Validation(#[from] PostValidationError),

    #[error("Repository error: {0}")]
    Repository(#[from] PollsRepositoryError),
}
