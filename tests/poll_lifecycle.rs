//! End-to-end poll scenarios driven through the bot's message handler,
//! against both storage backends.

use std::sync::Arc;
use tallybot::bot::PollBot;
use tallybot::channels::IncomingMessage;
use tallybot::polls::{CommandParser, Locale, PollEngine, ReplyFormatter};
use tallybot::storage::{DynPollStore, MemoryStore, SqliteStore};

const CHANNEL: &str = "town-square";

fn bot_with(store: DynPollStore) -> PollBot {
    PollBot::new(
        "tallybot",
        CommandParser::new("/").unwrap(),
        PollEngine::new(store),
        ReplyFormatter::new(Locale::En, "/"),
    )
}

async fn say(bot: &PollBot, user: &str, text: &str) -> String {
    bot.handle_message(&IncomingMessage::new(CHANNEL, user, text))
        .await
        .unwrap_or_else(|| panic!("no reply to {:?}", text))
        .text
}

/// Pull the poll ID out of a creation reply
fn poll_id_from(reply: &str) -> String {
    let start = reply.find("ID: `").expect("reply carries an ID") + "ID: `".len();
    let end = reply[start..].find('`').expect("ID is closed") + start;
    reply[start..end].to_string()
}

async fn lunch_scenario(bot: &PollBot) {
    let created = say(bot, "alice", "/create Lunch? | Pizza | Sushi").await;
    assert!(created.starts_with("Poll \"Lunch?\" has been created!"));
    assert!(created.contains("    1. Pizza\n    2. Sushi\n"));
    let id = poll_id_from(&created);
    assert_eq!(id.len(), 10);
    assert!(created.contains(&format!("`/vote {} 1`", id)));

    assert_eq!(
        say(bot, "bob", &format!("/vote {} 1", id)).await,
        "You voted for option 1 (Pizza)"
    );
    assert_eq!(
        say(bot, "carol", &format!("/vote {} 2", id)).await,
        "You voted for option 2 (Sushi)"
    );
    assert_eq!(
        say(bot, "bob", &format!("/vote {} 2", id)).await,
        "You changed your vote to option 2 (Sushi)"
    );

    let results = say(bot, "dave", &format!("/results {}", id)).await;
    assert!(results.contains("Status: active"));
    assert!(results.contains("    1. Pizza: 0\n    2. Sushi: 2\n"));

    assert_eq!(
        say(bot, "bob", &format!("/end {}", id)).await,
        "You cannot end this poll because you are not its owner."
    );
    assert_eq!(
        say(bot, "alice", &format!("/end {}", id)).await,
        format!(
            "Poll `{}` has been closed. Get the results with `/results {}`",
            id, id
        )
    );

    assert_eq!(
        say(bot, "dave", &format!("/vote {} 1", id)).await,
        "This poll is closed and no longer accepts votes."
    );

    let results = say(bot, "dave", &format!("/results {}", id)).await;
    assert!(results.contains("Status: closed"));
    assert!(results.contains("Owner: `alice`"));
    assert!(results.contains("    1. Pizza: 0\n    2. Sushi: 2\n"));

    assert_eq!(
        say(bot, "dave", &format!("/delete {}", id)).await,
        "You cannot delete this poll because you are not its owner."
    );
    assert!(say(bot, "dave", &format!("/results {}", id))
        .await
        .contains("Question: Lunch?"));

    assert_eq!(
        say(bot, "alice", &format!("/delete {}", id)).await,
        format!("Poll `{}` has been deleted", id)
    );
    assert_eq!(
        say(bot, "alice", &format!("/results {}", id)).await,
        "This poll does not exist."
    );
}

#[tokio::test]
async fn test_lunch_poll_in_memory() {
    let bot = bot_with(Arc::new(MemoryStore::new()));
    lunch_scenario(&bot).await;
}

#[tokio::test]
async fn test_lunch_poll_in_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("polls.db").display());
    let store = SqliteStore::connect(&url, 4).await.unwrap();
    let bot = bot_with(Arc::new(store.clone()));
    lunch_scenario(&bot).await;
    store.close().await;
}

#[tokio::test]
async fn test_polls_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("polls.db").display());

    let id = {
        let store = SqliteStore::connect(&url, 2).await.unwrap();
        let bot = bot_with(Arc::new(store.clone()));
        let id = poll_id_from(&say(&bot, "alice", "/create Tea or coffee? | Tea | Coffee").await);
        say(&bot, "bob", &format!("/vote {} 2", id)).await;
        store.close().await;
        id
    };

    let store = SqliteStore::connect(&url, 2).await.unwrap();
    let bot = bot_with(Arc::new(store));
    let results = say(&bot, "carol", &format!("/results {}", id)).await;
    assert!(results.contains("    1. Tea: 0\n    2. Coffee: 1\n"));
}

#[tokio::test]
async fn test_invalid_choices_are_rejected() {
    let bot = bot_with(Arc::new(MemoryStore::new()));
    let id = poll_id_from(&say(&bot, "alice", "/create Pick | A | B").await);

    assert_eq!(
        say(&bot, "bob", &format!("/vote {} 3", id)).await,
        "This poll has no option 3. Pick a number from 1 to 2."
    );
    assert!(say(&bot, "bob", &format!("/vote {} 0", id))
        .await
        .contains("/vote <poll ID> <option number>"));
    assert!(say(&bot, "bob", &format!("/results {}", id))
        .await
        .contains("    1. A: 0\n    2. B: 0\n"));
}

#[tokio::test]
async fn test_concurrent_voters() {
    let store: DynPollStore = Arc::new(MemoryStore::new());
    let bot = Arc::new(bot_with(store));
    let id = poll_id_from(&say(&bot, "alice", "/create Sprint name? | Red | Blue").await);

    let mut handles = Vec::new();
    for i in 0..20 {
        let bot = bot.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            let user = format!("user{}", i % 5);
            let choice = i % 2 + 1;
            bot.handle_message(&IncomingMessage::new(
                CHANNEL,
                user,
                format!("/vote {} {}", id, choice),
            ))
            .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_some());
    }

    // Five distinct voters, one vote each
    let results = say(&bot, "alice", &format!("/results {}", id)).await;
    let total: u64 = results
        .lines()
        .filter_map(|l| l.rsplit(": ").next()?.parse::<u64>().ok())
        .sum();
    assert_eq!(total, 5);
}
