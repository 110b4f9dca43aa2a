//! Poll Storage
//!
//! Exact-key access to the `polls` and `votes` collections.

pub mod memory;
pub mod sqlite;

use crate::polls::{Poll, Vote};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Record already exists: {key}")]
    Conflict { key: String },

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Codec error: {0}")]
    Codec(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Backend for polls and votes.
///
/// `upsert_vote` must be a single atomic write on the backend side; callers
/// never read-modify-write a vote.
#[async_trait]
pub trait PollStore: Send + Sync {
    /// Insert a new poll. Fails with `Conflict` if the ID is taken.
    async fn insert_poll(&self, poll: &Poll) -> StoreResult<()>;

    /// Load a poll, or `NotFound`
    async fn get_poll(&self, poll_id: &str) -> StoreResult<Poll>;

    /// Remove a poll and, if `with_votes`, every vote for it in the same
    /// atomic step. Returns the number of votes removed.
    async fn delete_poll(&self, poll_id: &str, with_votes: bool) -> StoreResult<u64>;

    /// Set the `is_active` flag without rewriting the rest of the poll
    async fn update_poll_active(&self, poll_id: &str, is_active: bool) -> StoreResult<()>;

    /// Load one user's vote, or `NotFound`
    async fn get_vote(&self, poll_id: &str, user_id: &str) -> StoreResult<Vote>;

    /// Insert the vote, or overwrite `choice` if the user already voted
    async fn upsert_vote(&self, poll_id: &str, user_id: &str, choice: usize) -> StoreResult<()>;

    /// All votes for a poll, in no particular order
    async fn scan_votes_for_poll(&self, poll_id: &str) -> StoreResult<Vec<Vote>>;
}

/// Type-erased store shared by the engine
pub type DynPollStore = Arc<dyn PollStore>;
