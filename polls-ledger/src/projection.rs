//! Display figures derived from a post's stored tally.
//!
//! Percentages are rounded per option and are not adjusted to sum to 100.
//! The stored tally may briefly lag the vote ledger, so a vote that was just
//! recorded can be missing from these figures until its increment lands.
use polls_shared::types::{Post, Tally};
use serde::Serialize;

/// Share of one option, `round(count / total * 100)`, or 0 when there are no votes.
pub fn percentage(count: i64, total: i64) -> u32 {
    if total <= 0 || count <= 0 {
        return 0;
    }
    ((count as f64 / total as f64) * 100.0).round() as u32
}

/// Percentage of every counter in a tally, against its running total.
pub fn percentages(tally: &Tally) -> Vec<u32> {
    tally
        .counts()
        .iter()
        .map(|count| percentage(*count, tally.total()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionResult {
    pub option_index: usize,
    pub label: String,
    pub votes: i64,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostResults {
    pub total_votes: i64,
    pub options: Vec<OptionResult>,
}

/// Per-option results of a post, one entry per option label.
pub fn project(post: &Post) -> PostResults {
    let tally = post.tally();
    PostResults {
        total_votes: tally.total(),
        options: post
            .options()
            .iter()
            .enumerate()
            .map(|(option_index, label)| OptionResult {
                option_index,
                label: label.clone(),
                votes: tally.count(option_index),
                percentage: percentage(tally.count(option_index), tally.total()),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use polls_shared::types::{AccountId, PostId, PostParts, Visibility, VotingWindow};
    use uuid::Uuid;

    #[test]
    fn test_zero_total_gives_zero_percentages() {
        let tally = Tally::zeroed(3);
        assert_eq!(percentages(&tally), vec![0, 0, 0]);
    }

    #[test]
    fn test_percentages_round_independently() {
        let tally = Tally::new(vec![1, 1, 1], 3).unwrap();
        assert_eq!(percentages(&tally), vec![33, 33, 33]);

        let tally = Tally::new(vec![1, 2], 3).unwrap();
        assert_eq!(percentages(&tally), vec![33, 67]);
    }

    #[test]
    fn test_project_uses_option_labels() {
        let post = Post::from_parts(PostParts {
            id: PostId::new(Uuid::new_v4()),
            owner_id: AccountId::new(Uuid::new_v4()),
            title: "Cat or Dog".to_string(),
            images: vec!["cat.png".to_string(), "dog.png".to_string()],
            options: vec!["Cat".to_string(), "Dog".to_string()],
            votes: vec![1, 3, 0],
            total_votes: 4,
            visibility: Visibility::Public,
            window: VotingWindow::always_open(),
            hidden: false,
            created_at: Utc::now(),
        })
        .unwrap();

        let results = project(&post);

        assert_eq!(results.total_votes, 4);
        assert_eq!(results.options.len(), 2);
        assert_eq!(results.options[0].label, "Cat");
        assert_eq!(results.options[0].percentage, 25);
        assert_eq!(results.options[1].votes, 3);
        assert_eq!(results.options[1].percentage, 75);
    }
}
