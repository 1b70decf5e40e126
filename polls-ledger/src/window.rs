//! Voting window evaluation and the clock it is evaluated against.
//!
//! [`evaluate`] is a pure function of the current instant and a post's
//! configured window. Callers re-evaluate it as time passes; nothing about
//! the resulting state is stored.
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use polls_shared::types::{VotingWindow, WindowState};

/// Derive the campaign state of a window at `now`.
///
/// Boundary instants are exclusive: at `now == start` voting has not opened
/// yet, and at `now == end` it has already closed.
///
/// # Arguments
///
/// * `now` - The instant to evaluate at
/// * `window` - The post's configured start and end, either of which may be absent
///
/// # Returns
///
/// * `AlwaysActive` - Neither bound is configured
/// * `Countdown` - A start is configured and has not passed
/// * `Closed` - An end is configured and has been reached
/// * `Active` - Otherwise
pub fn evaluate(now: DateTime<Utc>, window: &VotingWindow) -> WindowState {
    if window.is_unbounded() {
        return WindowState::AlwaysActive;
    }
    if let Some(starts_at) = window.starts_at {
        if now <= starts_at {
            return WindowState::Countdown;
        }
    }
    if let Some(ends_at) = window.ends_at {
        if now >= ends_at {
            return WindowState::Closed;
        }
    }
    WindowState::Active
}

/// Time left until voting opens, while the window is counting down.
pub fn until_open(now: DateTime<Utc>, window: &VotingWindow) -> Option<Duration> {
    match (evaluate(now, window), window.starts_at) {
        (WindowState::Countdown, Some(starts_at)) => Some(starts_at - now),
        _ => None,
    }
}

/// Time left until voting closes, while votes are accepted under an end bound.
pub fn until_close(now: DateTime<Utc>, window: &VotingWindow) -> Option<Duration> {
    match (evaluate(now, window), window.ends_at) {
        (WindowState::Active, Some(ends_at)) => Some(ends_at - now),
        _ => None,
    }
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    fn window(start: Option<u32>, end: Option<u32>) -> VotingWindow {
        VotingWindow::new(start.map(at), end.map(at)).unwrap()
    }

    #[test]
    fn test_unbounded_window_is_always_active() {
        assert_eq!(evaluate(at(0), &VotingWindow::always_open()), WindowState::AlwaysActive);
    }

    #[test]
    fn test_bounded_window_states() {
        let w = window(Some(10), Some(12));

        assert_eq!(evaluate(at(9), &w), WindowState::Countdown);
        assert_eq!(evaluate(at(11), &w), WindowState::Active);
        assert_eq!(evaluate(at(13), &w), WindowState::Closed);
    }

    #[test]
    fn test_boundary_instants_are_exclusive() {
        let w = window(Some(10), Some(12));

        assert_eq!(evaluate(at(10), &w), WindowState::Countdown);
        assert_eq!(evaluate(at(12), &w), WindowState::Closed);
        assert!(!evaluate(at(10), &w).accepts_votes());
        assert!(!evaluate(at(12), &w).accepts_votes());
    }

    #[test]
    fn test_start_only_window_stays_active() {
        let w = window(Some(10), None);

        assert_eq!(evaluate(at(10) + Duration::seconds(1), &w), WindowState::Active);
        assert_eq!(evaluate(at(23), &w), WindowState::Active);
    }

    #[test]
    fn test_end_only_window_is_active_until_end() {
        let w = window(None, Some(12));

        assert_eq!(evaluate(at(1), &w), WindowState::Active);
        assert_eq!(evaluate(at(12), &w), WindowState::Closed);
    }

    #[test]
    fn test_time_remaining() {
        let w = window(Some(10), Some(12));

        assert_eq!(until_open(at(9), &w), Some(Duration::hours(1)));
        assert_eq!(until_open(at(11), &w), None);
        assert_eq!(until_close(at(11), &w), Some(Duration::hours(1)));
        assert_eq!(until_close(at(13), &w), None);
    }

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(at(9));
        clock.advance(Duration::minutes(90));
        assert_eq!(clock.now(), at(10) + Duration::minutes(30));

        clock.set(at(1));
        assert_eq!(clock.now(), at(1));
    }
}
