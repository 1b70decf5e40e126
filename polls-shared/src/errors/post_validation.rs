use thiserror::Error;

/// Represents the ways a post can fail validation at the system boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PostValidationError {
    #[error("A post needs between {min} and {max} images, got {provided}")]
    ImageCount { provided: usize, min: usize, max: usize },

    #[error("Expected {expected} option labels, got {provided}")]
    OptionCount { provided: usize, expected: usize },

    #[error("Tally has {provided} counters but the post has {options} options")]
    TallyTooShort { provided: usize, options: usize },

    #[error("Tally counters must not be negative")]
    NegativeCount,

    #[error("Private posts require an access code")]
    MissingAccessCode,

    #[error("Invalid access code: {0}")]
    InvalidAccessCode(String),

    #[error("Voting window must end after it starts")]
    InvalidWindow,
}
