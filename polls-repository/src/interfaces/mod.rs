//! This module defines and re-exports the interfaces for the polls repository.
//! It serves as a central point for accessing traits related to data interaction.
mod moderation_repository;
mod polls_repository;

pub use moderation_repository::ModerationRepository;
pub use polls_repository::PollsRepository;
