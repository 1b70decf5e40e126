use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::PostValidationError;

/// Optional `[start, end)` interval during which votes may be cast.
///
/// Either bound may be absent; with neither bound the post is always open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingWindow {
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl VotingWindow {
    /// Builds a window, rejecting one that ends before or at its start.
    pub fn new(
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
    ) -> Result<Self, PostValidationError> {
        if let (Some(start), Some(end)) = (starts_at, ends_at) {
            if end <= start {
                return Err(PostValidationError::InvalidWindow);
            }
        }
        Ok(Self { starts_at, ends_at })
    }

    pub fn always_open() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.starts_at.is_none() && self.ends_at.is_none()
    }
}

/// Campaign state derived from the current time and a `VotingWindow`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    /// No window configured.
    AlwaysActive,
    /// The window has not opened yet.
    Countdown,
    /// Inside a configured window.
    Active,
    /// The window has ended; voting is permanently disallowed.
    Closed,
}

impl WindowState {
    pub fn accepts_votes(&self) -> bool {
        matches!(self, WindowState::AlwaysActive | WindowState::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_rejects_end_before_start() {
        let now = Utc::now();
        assert_eq!(
            VotingWindow::new(Some(now), Some(now)),
            Err(PostValidationError::InvalidWindow)
        );
        assert_eq!(
            VotingWindow::new(Some(now), Some(now - Duration::hours(1))),
            Err(PostValidationError::InvalidWindow)
        );
    }

    #[test]
    fn test_new_accepts_half_open_windows() {
        let now = Utc::now();
        assert!(VotingWindow::new(Some(now), None).is_ok());
        assert!(VotingWindow::new(None, Some(now)).is_ok());
        assert!(VotingWindow::new(None, None).unwrap().is_unbounded());
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_string(&WindowState::AlwaysActive).unwrap();
        assert_eq!(json, "\"always_active\"");
        assert!(!WindowState::Countdown.accepts_votes());
        assert!(!WindowState::Closed.accepts_votes());
        assert!(WindowState::Active.accepts_votes());
    }
}
