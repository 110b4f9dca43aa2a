//! Poll Model
//!
//! Polls, votes and the derived per-option tally.

use serde::{Deserialize, Serialize};

/// A poll created from a chat command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    /// Short identifier, generated at creation
    pub id: String,
    /// User ID of the poll creator
    pub owner_id: String,
    /// Poll question
    pub question: String,
    /// Options in display order, indexed from zero
    pub options: Vec<String>,
    /// Whether the poll still accepts votes
    pub is_active: bool,
}

impl Poll {
    /// Create a new, active poll
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        question: impl Into<String>,
        options: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            question: question.into(),
            options,
            is_active: true,
        }
    }

    /// Whether `user_id` created this poll
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    /// Convert a one-based choice as typed by a user into an option index.
    pub fn option_index(&self, choice: u64) -> Option<usize> {
        let index = usize::try_from(choice).ok()?.checked_sub(1)?;
        (index < self.options.len()).then_some(index)
    }
}

/// A single user's current choice in a poll.
///
/// Identified by `(poll_id, user_id)`; voting again replaces `choice`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub poll_id: String,
    pub user_id: String,
    /// Zero-based option index
    pub choice: usize,
}

impl Vote {
    pub fn new(poll_id: impl Into<String>, user_id: impl Into<String>, choice: usize) -> Self {
        Self {
            poll_id: poll_id.into(),
            user_id: user_id.into(),
            choice,
        }
    }
}

/// Per-option vote counts, aligned with `Poll::options`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Tally {
    counts: Vec<u64>,
}

impl Tally {
    /// Count votes for a poll with `option_count` options.
    ///
    /// Votes pointing past the last option are skipped.
    pub fn from_votes<'a>(option_count: usize, votes: impl IntoIterator<Item = &'a Vote>) -> Self {
        let mut counts = vec![0u64; option_count];
        for vote in votes {
            match counts.get_mut(vote.choice) {
                Some(count) => *count += 1,
                None => tracing::warn!(
                    poll_id = %vote.poll_id,
                    user_id = %vote.user_id,
                    choice = vote.choice,
                    "Skipping vote outside the poll's option range"
                ),
            }
        }
        Self { counts }
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Count for a zero-based option index
    pub fn count(&self, index: usize) -> u64 {
        self.counts.get(index).copied().unwrap_or(0)
    }

    /// Total number of counted votes
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lunch() -> Poll {
        Poll::new(
            "abc",
            "alice",
            "Lunch?",
            vec!["Pizza".to_string(), "Sushi".to_string()],
        )
    }

    #[test]
    fn test_new_poll_is_active() {
        let poll = lunch();
        assert!(poll.is_active);
        assert!(poll.is_owned_by("alice"));
        assert!(!poll.is_owned_by("bob"));
    }

    #[test]
    fn test_option_index() {
        let poll = lunch();
        assert_eq!(poll.option_index(1), Some(0));
        assert_eq!(poll.option_index(2), Some(1));
        assert_eq!(poll.option_index(0), None);
        assert_eq!(poll.option_index(3), None);
        assert_eq!(poll.option_index(u64::MAX), None);
    }

    #[test]
    fn test_tally_counts_by_choice() {
        let votes = vec![
            Vote::new("abc", "bob", 1),
            Vote::new("abc", "carol", 1),
            Vote::new("abc", "dave", 0),
        ];
        let tally = Tally::from_votes(3, &votes);
        assert_eq!(tally.counts(), &[1, 2, 0]);
        assert_eq!(tally.total(), 3);
        assert_eq!(tally.count(7), 0);
    }

    #[test]
    fn test_tally_skips_out_of_range() {
        let votes = vec![Vote::new("abc", "bob", 5)];
        let tally = Tally::from_votes(2, &votes);
        assert_eq!(tally.counts(), &[0, 0]);
    }
}
