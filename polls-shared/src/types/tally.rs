use serde::{Deserialize, Serialize};

use crate::errors::PostValidationError;

/// Cached per-option counters and running total for a post.
///
/// Derived from the vote ledger and only mutated through it. The counters may
/// be longer than the option list (older rows) but never shorter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tally {
    counts: Vec<i64>,
    total: i64,
}

impl Tally {
    pub fn new(counts: Vec<i64>, total: i64) -> Result<Self, PostValidationError> {
        if total < 0 || counts.iter().any(|c| *c < 0) {
            return Err(PostValidationError::NegativeCount);
        }
        Ok(Self { counts, total })
    }

    /// A zeroed tally with one counter per option.
    pub fn zeroed(options: usize) -> Self {
        Self {
            counts: vec![0; options],
            total: 0,
        }
    }

    /// Recomputes a tally from the option index of every recorded vote.
    ///
    /// Counters are extended when a vote references an index beyond `options`.
    pub fn from_option_indices<I>(options: usize, indices: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut tally = Self::zeroed(options);
        for index in indices {
            tally.increment(index);
        }
        tally
    }

    pub fn counts(&self) -> &[i64] {
        &self.counts
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn count(&self, option_index: usize) -> i64 {
        self.counts.get(option_index).copied().unwrap_or(0)
    }

    pub fn sum(&self) -> i64 {
        self.counts.iter().sum()
    }

    /// Whether the running total equals the sum of the counters.
    pub fn is_consistent(&self) -> bool {
        self.sum() == self.total
    }

    /// Adds one vote to `option_index` and to the total, growing the counters if needed.
    pub fn increment(&mut self, option_index: usize) {
        if self.counts.len() <= option_index {
            self.counts.resize(option_index + 1, 0);
        }
        self.counts[option_index] += 1;
        self.total += 1;
    }
}
