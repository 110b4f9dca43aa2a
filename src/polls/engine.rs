//! Poll Engine
//!
//! Handles poll creation, voting, closing, deletion and result calculation
//! on top of a [`PollStore`].

use super::command::Command;
use super::error::{CommandKind, OwnerAction, PollError, PollResult};
use super::id::generate_poll_id;
use super::model::{Poll, Tally};
use crate::storage::{DynPollStore, StoreError};
use tracing::{info, warn};

/// Engine behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Remove a poll's votes together with the poll
    pub cascade_delete_votes: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cascade_delete_votes: true,
        }
    }
}

/// Successful result of a poll command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created {
        poll: Poll,
    },
    Voted {
        poll_id: String,
        /// One-based option number
        choice: u64,
        option: String,
        /// Whether an earlier vote by the same user was replaced
        changed: bool,
    },
    Ended {
        poll_id: String,
    },
    Deleted {
        poll_id: String,
    },
    Results {
        poll: Poll,
        tally: Tally,
    },
}

/// Poll engine for managing polls
pub struct PollEngine {
    store: DynPollStore,
    settings: EngineSettings,
}

impl PollEngine {
    /// Create a poll engine over a store
    pub fn new(store: DynPollStore) -> Self {
        Self {
            store,
            settings: EngineSettings::default(),
        }
    }

    /// Override the default settings
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Run a parsed command on behalf of `user_id`
    pub async fn dispatch(&self, command: Command, user_id: &str) -> PollResult<Outcome> {
        match command {
            Command::Create { question, options } => self.create(question, options, user_id).await,
            Command::Vote { poll_id, choice } => self.vote(&poll_id, user_id, choice).await,
            Command::End { poll_id } => self.end(&poll_id, user_id).await,
            Command::Delete { poll_id } => self.delete(&poll_id, user_id).await,
            Command::Results { poll_id } => self.results(&poll_id).await,
        }
    }

    /// Create a new active poll owned by `owner_id`.
    ///
    /// An ID collision in the store is reported as a storage error and not retried.
    pub async fn create(
        &self,
        question: String,
        options: Vec<String>,
        owner_id: &str,
    ) -> PollResult<Outcome> {
        if question.trim().is_empty() || options.is_empty() {
            return Err(PollError::MalformedCommand {
                kind: CommandKind::Create,
                raw: question,
            });
        }

        let poll = Poll::new(generate_poll_id(), owner_id, question, options);
        self.store.insert_poll(&poll).await?;

        info!(
            user_id = %owner_id,
            poll_id = %poll.id,
            options = poll.options.len(),
            "Poll created"
        );
        Ok(Outcome::Created { poll })
    }

    /// Record `user_id`'s choice (one-based), replacing any earlier vote
    pub async fn vote(&self, poll_id: &str, user_id: &str, choice: u64) -> PollResult<Outcome> {
        let poll = self.load_poll(poll_id).await?;

        if !poll.is_active {
            return Err(PollError::PollClosed {
                poll_id: poll.id,
            });
        }

        let index = poll
            .option_index(choice)
            .ok_or_else(|| PollError::InvalidChoice {
                poll_id: poll.id.clone(),
                choice,
                option_count: poll.options.len(),
            })?;

        // Only decides the reply wording; the write below is the real decision.
        let changed = match self.store.get_vote(poll_id, user_id).await {
            Ok(_) => true,
            Err(StoreError::NotFound) => false,
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    poll_id = %poll_id,
                    error = %e,
                    "Failed to look up existing vote"
                );
                false
            }
        };

        self.store.upsert_vote(poll_id, user_id, index).await?;

        info!(
            user_id = %user_id,
            poll_id = %poll_id,
            choice = choice,
            changed = changed,
            "Vote recorded"
        );
        Ok(Outcome::Voted {
            poll_id: poll.id.clone(),
            choice,
            option: poll.options[index].clone(),
            changed,
        })
    }

    /// Close a poll. Only the owner may do this; closing twice is not an error.
    pub async fn end(&self, poll_id: &str, user_id: &str) -> PollResult<Outcome> {
        let poll = self.load_owned_poll(poll_id, user_id, OwnerAction::End).await?;

        self.store.update_poll_active(&poll.id, false).await?;

        info!(user_id = %user_id, poll_id = %poll_id, "Poll ended");
        Ok(Outcome::Ended { poll_id: poll.id })
    }

    /// Delete a poll. Only the owner may do this, whether or not it is active.
    pub async fn delete(&self, poll_id: &str, user_id: &str) -> PollResult<Outcome> {
        let poll = self
            .load_owned_poll(poll_id, user_id, OwnerAction::Delete)
            .await?;

        let removed_votes = self
            .store
            .delete_poll(&poll.id, self.settings.cascade_delete_votes)
            .await?;

        info!(
            user_id = %user_id,
            poll_id = %poll_id,
            removed_votes = removed_votes,
            "Poll deleted"
        );
        Ok(Outcome::Deleted { poll_id: poll.id })
    }

    /// Tally the current votes of a poll. Open to everyone.
    pub async fn results(&self, poll_id: &str) -> PollResult<Outcome> {
        let poll = self.load_poll(poll_id).await?;
        let votes = self.store.scan_votes_for_poll(&poll.id).await?;
        let tally = Tally::from_votes(poll.options.len(), &votes);

        info!(poll_id = %poll_id, total = tally.total(), "Poll results computed");
        Ok(Outcome::Results { poll, tally })
    }

    async fn load_poll(&self, poll_id: &str) -> PollResult<Poll> {
        match self.store.get_poll(poll_id).await {
            Ok(poll) => Ok(poll),
            Err(StoreError::NotFound) => Err(PollError::NotFound {
                poll_id: poll_id.to_string(),
            }),
            Err(e) => Err(PollError::Storage(e)),
        }
    }

    async fn load_owned_poll(
        &self,
        poll_id: &str,
        user_id: &str,
        action: OwnerAction,
    ) -> PollResult<Poll> {
        let poll = self.load_poll(poll_id).await?;
        if !poll.is_owned_by(user_id) {
            return Err(PollError::Unauthorized {
                poll_id: poll.id,
                user_id: user_id.to_string(),
                action,
            });
        }
        Ok(poll)
    }
}
