//! Command Parser
//!
//! Turns one chat message into a poll command. The parser is built once at
//! startup and is read-only afterwards.
//!
//! Grammar (with the default `/` prefix):
//! - `/create Question? | Option 1 | Option 2 ...`
//! - `/vote <poll_id> <n>` where `n` is one-based
//! - `/end <poll_id>`, `/delete <poll_id>`, `/results <poll_id>`
//! - `/guide`

use super::error::{CommandKind, PollError};
use regex::Regex;

/// A validated poll command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Create {
        question: String,
        options: Vec<String>,
    },
    Vote {
        poll_id: String,
        /// One-based option number as typed
        choice: u64,
    },
    End {
        poll_id: String,
    },
    Delete {
        poll_id: String,
    },
    Results {
        poll_id: String,
    },
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Create { .. } => CommandKind::Create,
            Command::Vote { .. } => CommandKind::Vote,
            Command::End { .. } => CommandKind::End,
            Command::Delete { .. } => CommandKind::Delete,
            Command::Results { .. } => CommandKind::Results,
        }
    }
}

/// What a message turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// A poll command for the engine
    Command(Command),
    /// Request for the help text
    Guide,
    /// Not addressed to the bot
    Ignored,
}

/// Keywords checked in order against the text after the prefix
const KEYWORDS: [CommandKind; 5] = [
    CommandKind::Create,
    CommandKind::Vote,
    CommandKind::End,
    CommandKind::Delete,
    CommandKind::Results,
];

const GUIDE: &str = "guide";

/// Message parser for a given command prefix
#[derive(Debug, Clone)]
pub struct CommandParser {
    prefix: String,
    create: Regex,
    vote: Regex,
    target: Regex,
}

impl CommandParser {
    /// Build a parser for commands starting with `prefix`
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let p = regex::escape(prefix);
        Ok(Self {
            prefix: prefix.to_string(),
            create: Regex::new(&format!(r"(?s)^{p}create\s+([^|]+)\|(.+)$"))?,
            vote: Regex::new(&format!(r"^{p}vote\s+([A-Za-z0-9_-]+)\s+([1-9][0-9]*)$"))?,
            target: Regex::new(&format!(
                r"^{p}(end|delete|results)\s+([A-Za-z0-9_-]+)$"
            ))?,
        })
    }

    /// Parse a message.
    ///
    /// Returns `MalformedCommand` when the message starts with a command
    /// keyword but does not match its pattern, e.g. `/endless abc`. Text that
    /// starts with neither a command keyword nor `guide` is `Ignored`.
    pub fn parse(&self, text: &str) -> Result<Parsed, PollError> {
        let text = text.trim();
        let Some(rest) = text.strip_prefix(self.prefix.as_str()) else {
            return Ok(Parsed::Ignored);
        };

        // First keyword the message starts with wins; the pattern check below
        // decides whether it is well-formed.
        let Some(kind) = KEYWORDS
            .iter()
            .copied()
            .find(|kind| rest.starts_with(kind.keyword()))
        else {
            return Ok(if rest.starts_with(GUIDE) {
                Parsed::Guide
            } else {
                Parsed::Ignored
            });
        };

        let command = match kind {
            CommandKind::Create => self.parse_create(text),
            CommandKind::Vote => self.parse_vote(text),
            CommandKind::End | CommandKind::Delete | CommandKind::Results => {
                self.parse_target(text)
            }
        };

        command
            .map(Parsed::Command)
            .ok_or_else(|| PollError::MalformedCommand {
                kind,
                raw: text.to_string(),
            })
    }

    fn parse_create(&self, text: &str) -> Option<Command> {
        let caps = self.create.captures(text)?;
        let question = caps[1].trim();
        if question.is_empty() {
            return None;
        }

        let options: Vec<String> = caps[2].split('|').map(|o| o.trim().to_string()).collect();
        if options.iter().any(String::is_empty) {
            return None;
        }

        Some(Command::Create {
            question: question.to_string(),
            options,
        })
    }

    fn parse_vote(&self, text: &str) -> Option<Command> {
        let caps = self.vote.captures(text)?;
        // Too many digits for u64 is still a number, just not a valid option
        let choice = caps[2].parse::<u64>().unwrap_or(u64::MAX);
        Some(Command::Vote {
            poll_id: caps[1].to_string(),
            choice,
        })
    }

    fn parse_target(&self, text: &str) -> Option<Command> {
        let caps = self.target.captures(text)?;
        let poll_id = caps[2].to_string();
        match &caps[1] {
            "end" => Some(Command::End { poll_id }),
            "delete" => Some(Command::Delete { poll_id }),
            "results" => Some(Command::Results { poll_id }),
            _ => None,
        }
    }
}
