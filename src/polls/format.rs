//! Reply Formatting
//!
//! Renders engine outcomes and errors as chat replies. The wording is
//! localised; the information carried (poll ID, numbered options, counts in
//! option order, open/closed status) is the same in every locale.

use super::engine::Outcome;
use super::error::{CommandKind, OwnerAction, PollError};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Reply language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "ru" | "russian" => Ok(Locale::Ru),
            other => Err(format!("Unsupported locale: {}", other)),
        }
    }
}

/// Turns outcomes into reply text for one locale and command prefix
#[derive(Debug, Clone)]
pub struct ReplyFormatter {
    locale: Locale,
    prefix: String,
}

impl ReplyFormatter {
    pub fn new(locale: Locale, prefix: impl Into<String>) -> Self {
        Self {
            locale,
            prefix: prefix.into(),
        }
    }

    /// Reply for a successful command
    pub fn outcome(&self, outcome: &Outcome) -> String {
        let p = &self.prefix;
        match (self.locale, outcome) {
            (locale, Outcome::Created { poll }) => {
                let mut msg = match locale {
                    Locale::En => format!(
                        "Poll \"{}\" has been created!\nID: `{}`\nOptions:\n",
                        poll.question, poll.id
                    ),
                    Locale::Ru => format!(
                        "Опрос \"{}\" создан!\nID: `{}`\nВарианты ответа:\n",
                        poll.question, poll.id
                    ),
                };
                for (i, option) in poll.options.iter().enumerate() {
                    let _ = writeln!(msg, "    {}. {}", i + 1, option);
                }
                let first = poll.options.first().map(String::as_str).unwrap_or_default();
                let _ = match locale {
                    Locale::En => write!(
                        msg,
                        "Share this message with the participants.\nFor example, to vote for option 1 ({}) send `{}vote {} 1`",
                        first, p, poll.id
                    ),
                    Locale::Ru => write!(
                        msg,
                        "Перешли это сообщение участникам.\nНапример, чтобы проголосовать за вариант 1 ({}), отправь `{}vote {} 1`",
                        first, p, poll.id
                    ),
                };
                msg
            }
            (Locale::En, Outcome::Voted {
                choice,
                option,
                changed,
                ..
            }) => {
                if *changed {
                    format!("You changed your vote to option {} ({})", choice, option)
                } else {
                    format!("You voted for option {} ({})", choice, option)
                }
            }
            (Locale::Ru, Outcome::Voted {
                choice,
                option,
                changed,
                ..
            }) => {
                if *changed {
                    format!("Ты изменил свой голос на вариант {} ({})", choice, option)
                } else {
                    format!("Ты проголосовал за вариант {} ({})", choice, option)
                }
            }
            (Locale::En, Outcome::Ended { poll_id }) => format!(
                "Poll `{}` has been closed. Get the results with `{}results {}`",
                poll_id, p, poll_id
            ),
            (Locale::Ru, Outcome::Ended { poll_id }) => format!(
                "Опрос `{}` завершен. Результаты можно получить командой `{}results {}`",
                poll_id, p, poll_id
            ),
            (Locale::En, Outcome::Deleted { poll_id }) => {
                format!("Poll `{}` has been deleted", poll_id)
            }
            (Locale::Ru, Outcome::Deleted { poll_id }) => format!("Опрос `{}` удален", poll_id),
            (locale, Outcome::Results { poll, tally }) => {
                let mut msg = match locale {
                    Locale::En => format!(
                        "Results for poll `{}`\nQuestion: {}\nOwner: `{}`\nStatus: {}\n",
                        poll.id,
                        poll.question,
                        poll.owner_id,
                        if poll.is_active { "active" } else { "closed" }
                    ),
                    Locale::Ru => format!(
                        "Результаты опроса `{}`\nВопрос: {}\nСоздатель: `{}`\nСтатус: {}\n",
                        poll.id,
                        poll.question,
                        poll.owner_id,
                        if poll.is_active { "активен" } else { "завершен" }
                    ),
                };
                for (i, option) in poll.options.iter().enumerate() {
                    let _ = writeln!(msg, "    {}. {}: {}", i + 1, option, tally.count(i));
                }
                msg
            }
        }
    }

    /// Reply for a failed command
    pub fn error(&self, error: &PollError) -> String {
        match self.locale {
            Locale::En => self.error_en(error),
            Locale::Ru => self.error_ru(error),
        }
    }

    fn error_en(&self, error: &PollError) -> String {
        match error {
            PollError::MalformedCommand { kind, .. } => format!(
                "Could not understand the command. Use `{}`",
                self.usage(*kind)
            ),
            PollError::NotFound { .. } => "This poll does not exist.".to_string(),
            PollError::Unauthorized { action, .. } => format!(
                "You cannot {} this poll because you are not its owner.",
                action
            ),
            PollError::PollClosed { .. } => {
                "This poll is closed and no longer accepts votes.".to_string()
            }
            PollError::InvalidChoice {
                choice,
                option_count,
                ..
            } => format!(
                "This poll has no option {}. Pick a number from 1 to {}.",
                choice, option_count
            ),
            PollError::Storage(_) => "Something went wrong, please try again later.".to_string(),
        }
    }

    fn error_ru(&self, error: &PollError) -> String {
        match error {
            PollError::MalformedCommand { kind, .. } => format!(
                "Не удалось разобрать команду. Формат: `{}`",
                self.usage(*kind)
            ),
            PollError::NotFound { .. } => "Такого опроса не существует.".to_string(),
            PollError::Unauthorized { action, .. } => {
                let verb = match action {
                    OwnerAction::End => "завершить",
                    OwnerAction::Delete => "удалить",
                };
                format!(
                    "Ты не можешь {} этот опрос, потому что не являешься его владельцем.",
                    verb
                )
            }
            PollError::PollClosed { .. } => "Опрос завершен, голосовать больше нельзя.".to_string(),
            PollError::InvalidChoice {
                choice,
                option_count,
                ..
            } => format!(
                "В опросе нет варианта {}. Выбери число от 1 до {}.",
                choice, option_count
            ),
            PollError::Storage(_) => "Что-то пошло не так, попробуй позже.".to_string(),
        }
    }

    /// Usage line for a command
    pub fn usage(&self, kind: CommandKind) -> String {
        let p = &self.prefix;
        match (self.locale, kind) {
            (Locale::En, CommandKind::Create) => {
                format!("{}create Question? | Option 1 | Option 2", p)
            }
            (Locale::Ru, CommandKind::Create) => {
                format!("{}create Вопрос? | Вариант 1 | Вариант 2", p)
            }
            (Locale::En, CommandKind::Vote) => format!("{}vote <poll ID> <option number>", p),
            (Locale::Ru, CommandKind::Vote) => format!("{}vote <ID опроса> <номер варианта>", p),
            (Locale::En, kind) => format!("{}{} <poll ID>", p, kind),
            (Locale::Ru, kind) => format!("{}{} <ID опроса>", p, kind),
        }
    }

    /// Help text for the `guide` command
    pub fn guide(&self) -> String {
        let p = &self.prefix;
        match self.locale {
            Locale::En => format!(
                "Hi! I run quick polls right here in the chat.\n\
                 Commands:\n\
                 `{p}create Lunch? | Pizza | Sushi` creates a poll and replies with its numbered options and poll ID.\n\
                 `{p}vote <poll ID> 1` votes for option 1. Voting again changes your vote.\n\
                 `{p}results <poll ID>` shows the current counts.\n\
                 `{p}end <poll ID>` closes the poll for voting. Results stay available. Owner only.\n\
                 `{p}delete <poll ID>` removes the poll. Owner only."
            ),
            Locale::Ru => format!(
                "Привет! Я помогаю проводить опросы прямо в чате.\n\
                 Команды:\n\
                 `{p}create Обед? | Пицца | Суши` создает опрос и возвращает пронумерованные варианты и ID опроса.\n\
                 `{p}vote <ID опроса> 1` голос за вариант 1. Повторный голос меняет выбор.\n\
                 `{p}results <ID опроса>` показывает текущие результаты.\n\
                 `{p}end <ID опроса>` завершает голосование, результаты остаются доступны. Только для владельца.\n\
                 `{p}delete <ID опроса>` удаляет опрос. Только для владельца."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polls::model::{Poll, Tally, Vote};
    use crate::storage::StoreError;

    fn lunch() -> Poll {
        Poll::new(
            "abc123",
            "alice",
            "Lunch?",
            vec!["Pizza".to_string(), "Sushi".to_string()],
        )
    }

    fn formatter() -> ReplyFormatter {
        ReplyFormatter::new(Locale::En, "/")
    }

    #[test]
    fn test_created_lists_options_and_sample_vote() {
        let text = formatter().outcome(&Outcome::Created { poll: lunch() });
        assert_eq!(
            text,
            "Poll \"Lunch?\" has been created!\n\
             ID: `abc123`\n\
             Options:\n    1. Pizza\n    2. Sushi\n\
             Share this message with the participants.\n\
             For example, to vote for option 1 (Pizza) send `/vote abc123 1`"
        );
    }

    #[test]
    fn test_vote_wording() {
        let f = formatter();
        let voted = Outcome::Voted {
            poll_id: "abc123".to_string(),
            choice: 2,
            option: "Sushi".to_string(),
            changed: false,
        };
        assert_eq!(f.outcome(&voted), "You voted for option 2 (Sushi)");

        let changed = Outcome::Voted {
            poll_id: "abc123".to_string(),
            choice: 2,
            option: "Sushi".to_string(),
            changed: true,
        };
        assert_eq!(f.outcome(&changed), "You changed your vote to option 2 (Sushi)");
    }

    #[test]
    fn test_results_align_counts_with_options() {
        let mut poll = lunch();
        poll.is_active = false;
        let votes = vec![Vote::new("abc123", "bob", 1), Vote::new("abc123", "carol", 1)];
        let tally = Tally::from_votes(2, &votes);

        let text = formatter().outcome(&Outcome::Results { poll, tally });
        assert_eq!(
            text,
            "Results for poll `abc123`\n\
             Question: Lunch?\n\
             Owner: `alice`\n\
             Status: closed\n    1. Pizza: 0\n    2. Sushi: 2\n"
        );
    }

    #[test]
    fn test_russian_results_status() {
        let f = ReplyFormatter::new(Locale::Ru, "/");
        let text = f.outcome(&Outcome::Results {
            poll: lunch(),
            tally: Tally::from_votes(2, &Vec::<Vote>::new()),
        });
        assert!(text.contains("Статус: активен"));
        assert!(text.contains("`abc123`"));
        assert!(text.contains("1. Pizza: 0"));
        assert!(text.contains("2. Sushi: 0"));
    }

    #[test]
    fn test_ended_mentions_results_command() {
        let f = ReplyFormatter::new(Locale::En, "!");
        let text = f.outcome(&Outcome::Ended {
            poll_id: "abc123".to_string(),
        });
        assert!(text.contains("`!results abc123`"));
    }

    #[test]
    fn test_error_messages() {
        let f = formatter();
        assert_eq!(
            f.error(&PollError::MalformedCommand {
                kind: CommandKind::Vote,
                raw: "/vote".to_string(),
            }),
            "Could not understand the command. Use `/vote <poll ID> <option number>`"
        );
        assert_eq!(
            f.error(&PollError::Unauthorized {
                poll_id: "abc123".to_string(),
                user_id: "dave".to_string(),
                action: OwnerAction::End,
            }),
            "You cannot end this poll because you are not its owner."
        );
        assert_eq!(
            f.error(&PollError::InvalidChoice {
                poll_id: "abc123".to_string(),
                choice: 5,
                option_count: 2,
            }),
            "This poll has no option 5. Pick a number from 1 to 2."
        );
        let storage = f.error(&PollError::Storage(StoreError::Backend(
            "disk full".to_string(),
        )));
        assert!(!storage.contains("disk full"));
    }

    #[test]
    fn test_usage_for_target_commands() {
        let f = formatter();
        assert_eq!(f.usage(CommandKind::Delete), "/delete <poll ID>");
        assert_eq!(
            ReplyFormatter::new(Locale::Ru, "/").usage(CommandKind::Results),
            "/results <ID опроса>"
        );
    }

    #[test]
    fn test_guide_uses_prefix() {
        let guide = ReplyFormatter::new(Locale::En, "!").guide();
        assert!(guide.contains("`!create"));
        assert!(guide.contains("`!delete <poll ID>`"));
    }

    #[test]
    fn test_locale_from_str() {
        assert_eq!("RU".parse::<Locale>().unwrap(), Locale::Ru);
        assert_eq!("english".parse::<Locale>().unwrap(), Locale::En);
        assert!("de".parse::<Locale>().is_err());
    }
}
