//! In-memory Store
//!
//! Process-local backend. Each write runs under a single lock, which makes
//! `upsert_vote` atomic with respect to other callers.

use super::{PollStore, StoreError, StoreResult};
use crate::polls::{Poll, Vote};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Polls by ID
    polls: RwLock<HashMap<String, Poll>>,
    /// Choices by (poll_id, user_id)
    votes: RwLock<HashMap<(String, String), usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored votes across all polls
    pub fn vote_count(&self) -> usize {
        self.votes.read().len()
    }
}

#[async_trait]
impl PollStore for MemoryStore {
    async fn insert_poll(&self, poll: &Poll) -> StoreResult<()> {
        let mut polls = self.polls.write();
        if polls.contains_key(&poll.id) {
            return Err(StoreError::Conflict {
                key: poll.id.clone(),
            });
        }
        polls.insert(poll.id.clone(), poll.clone());
        Ok(())
    }

    async fn get_poll(&self, poll_id: &str) -> StoreResult<Poll> {
        self.polls
            .read()
            .get(poll_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn delete_poll(&self, poll_id: &str, with_votes: bool) -> StoreResult<u64> {
        // Both locks are held so no reader sees the poll gone with votes left
        let mut polls = self.polls.write();
        let mut votes = self.votes.write();
        polls.remove(poll_id);
        if !with_votes {
            return Ok(0);
        }
        let before = votes.len();
        votes.retain(|(id, _), _| id != poll_id);
        Ok((before - votes.len()) as u64)
    }

    async fn update_poll_active(&self, poll_id: &str, is_active: bool) -> StoreResult<()> {
        if let Some(poll) = self.polls.write().get_mut(poll_id) {
            poll.is_active = is_active;
        }
        Ok(())
    }

    async fn get_vote(&self, poll_id: &str, user_id: &str) -> StoreResult<Vote> {
        let votes = self.votes.read();
        let choice = votes
            .get(&(poll_id.to_string(), user_id.to_string()))
            .ok_or(StoreError::NotFound)?;
        Ok(Vote::new(poll_id, user_id, *choice))
    }

    async fn upsert_vote(&self, poll_id: &str, user_id: &str, choice: usize) -> StoreResult<()> {
        self.votes
            .write()
            .insert((poll_id.to_string(), user_id.to_string()), choice);
        Ok(())
    }

    async fn scan_votes_for_poll(&self, poll_id: &str) -> StoreResult<Vec<Vote>> {
        let votes = self.votes.read();
        Ok(votes
            .iter()
            .filter(|((id, _), _)| id == poll_id)
            .map(|((id, user), choice)| Vote::new(id.as_str(), user.as_str(), *choice))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll(id: &str) -> Poll {
        Poll::new(id, "alice", "Lunch?", vec!["Pizza".into(), "Sushi".into()])
    }

    #[tokio::test]
    async fn test_insert_conflict() {
        let store = MemoryStore::new();
        store.insert_poll(&poll("p1")).await.unwrap();

        let err = store.insert_poll(&poll("p1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { key } if key == "p1"));
    }

    #[tokio::test]
    async fn test_get_missing_poll() {
        let store = MemoryStore::new();
        let err = store.get_poll("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn test_update_active_flag() {
        let store = MemoryStore::new();
        store.insert_poll(&poll("p1")).await.unwrap();
        store.update_poll_active("p1", false).await.unwrap();

        let stored = store.get_poll("p1").await.unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.options, vec!["Pizza", "Sushi"]);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_choice() {
        let store = MemoryStore::new();
        store.upsert_vote("p1", "bob", 0).await.unwrap();
        store.upsert_vote("p1", "bob", 1).await.unwrap();

        let votes = store.scan_votes_for_poll("p1").await.unwrap();
        assert_eq!(votes, vec![Vote::new("p1", "bob", 1)]);
        assert_eq!(store.get_vote("p1", "bob").await.unwrap().choice, 1);
    }

    #[tokio::test]
    async fn test_delete_with_votes_is_scoped_to_poll() {
        let store = MemoryStore::new();
        store.insert_poll(&poll("p1")).await.unwrap();
        store.upsert_vote("p1", "bob", 0).await.unwrap();
        store.upsert_vote("p1", "carol", 1).await.unwrap();
        store.upsert_vote("p2", "bob", 0).await.unwrap();

        assert_eq!(store.delete_poll("p1", true).await.unwrap(), 2);
        assert!(matches!(store.get_poll("p1").await, Err(StoreError::NotFound)));
        assert_eq!(store.vote_count(), 1);
        assert!(store.scan_votes_for_poll("p1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_without_votes_keeps_them() {
        let store = MemoryStore::new();
        store.insert_poll(&poll("p1")).await.unwrap();
        store.upsert_vote("p1", "bob", 0).await.unwrap();

        assert_eq!(store.delete_poll("p1", false).await.unwrap(), 0);
        assert!(store.get_poll("p1").await.is_err());
        assert_eq!(store.vote_count(), 1);
    }

    #[test]
    fn test_deletes_are_idempotent() {
        let store = MemoryStore::new();
        tokio_test::assert_ok!(tokio_test::block_on(store.delete_poll("nope", false)));
        assert_eq!(
            tokio_test::block_on(store.delete_poll("nope", true)).unwrap(),
            0
        );
    }
}
