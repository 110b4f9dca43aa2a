//! Poll Errors
//!
//! Failure outcomes of a poll command. Every variant except `Storage` is a
//! user mistake that is answered with a reply and changes nothing.

use crate::storage::StoreError;
use thiserror::Error;

/// Which command a malformed message was meant to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Create,
    Vote,
    End,
    Delete,
    Results,
}

impl CommandKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            CommandKind::Create => "create",
            CommandKind::Vote => "vote",
            CommandKind::End => "end",
            CommandKind::Delete => "delete",
            CommandKind::Results => "results",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Owner-gated actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerAction {
    End,
    Delete,
}

impl std::fmt::Display for OwnerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OwnerAction::End => write!(f, "end"),
            OwnerAction::Delete => write!(f, "delete"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("Malformed {kind} command: {raw}")]
    MalformedCommand { kind: CommandKind, raw: String },

    #[error("Poll not found: {poll_id}")]
    NotFound { poll_id: String },

    #[error("User {user_id} may not {action} poll {poll_id}")]
    Unauthorized {
        poll_id: String,
        user_id: String,
        action: OwnerAction,
    },

    #[error("Poll is closed: {poll_id}")]
    PollClosed { poll_id: String },

    #[error("Invalid choice {choice} for poll {poll_id} with {option_count} options")]
    InvalidChoice {
        poll_id: String,
        choice: u64,
        option_count: usize,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl PollError {
    /// Whether the failure was caused by the user's input rather than the backend
    pub fn is_user_error(&self) -> bool {
        !matches!(self, PollError::Storage(_))
    }
}

pub type PollResult<T> = Result<T, PollError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_classification() {
        let err = PollError::PollClosed {
            poll_id: "abc".to_string(),
        };
        assert!(err.is_user_error());

        let err = PollError::from(StoreError::Backend("connection reset".to_string()));
        assert!(!err.is_user_error());
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_display_names_action() {
        let err = PollError::Unauthorized {
            poll_id: "abc".to_string(),
            user_id: "bob".to_string(),
            action: OwnerAction::Delete,
        };
        assert_eq!(err.to_string(), "User bob may not delete poll abc");
    }
}
