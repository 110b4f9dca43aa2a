//! Polling Module
//!
//! Chat polls: parsing text commands, running them against storage, and
//! rendering the replies.

pub mod command;
pub mod engine;
pub mod error;
pub mod format;
pub mod id;
pub mod model;

pub use command::{Command, CommandParser, Parsed};
pub use engine::{EngineSettings, Outcome, PollEngine};
pub use error::{CommandKind, OwnerAction, PollError, PollResult};
pub use format::{Locale, ReplyFormatter};
pub use model::{Poll, Tally, Vote};
