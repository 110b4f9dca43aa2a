//! SQLite Store
//!
//! Durable backend on sqlx. Votes are keyed by `(poll_id, user_id)` and
//! written with `INSERT ... ON CONFLICT DO UPDATE`, so concurrent votes from
//! the same user never produce two rows.

use super::{PollStore, StoreError, StoreResult};
use crate::polls::{Poll, Vote};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

/// SQLite poll store
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url` and ensure the schema exists
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Backend(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true);

        // Every connection to an in-memory database sees its own empty database.
        let in_memory = url.contains(":memory:");
        let mut pool_options = SqlitePoolOptions::new().max_connections(if in_memory {
            1
        } else {
            max_connections.max(1)
        });
        if in_memory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| backend_err("Failed to connect", e))?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    async fn init(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS polls (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                question TEXT NOT NULL,
                options TEXT NOT NULL,
                is_active INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| backend_err("Failed to create polls table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS votes (
                poll_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                choice INTEGER NOT NULL,
                PRIMARY KEY (poll_id, user_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| backend_err("Failed to create votes table", e))?;

        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to return
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn backend_err(context: &str, e: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("{}: {}", context, e))
}

fn poll_from_row(row: &SqliteRow) -> StoreResult<Poll> {
    let options: String = row
        .try_get("options")
        .map_err(|e| backend_err("Failed to read poll", e))?;
    let options: Vec<String> =
        serde_json::from_str(&options).map_err(|e| StoreError::Codec(e.to_string()))?;

    Ok(Poll {
        id: row
            .try_get("id")
            .map_err(|e| backend_err("Failed to read poll", e))?,
        owner_id: row
            .try_get("owner_id")
            .map_err(|e| backend_err("Failed to read poll", e))?,
        question: row
            .try_get("question")
            .map_err(|e| backend_err("Failed to read poll", e))?,
        options,
        is_active: row
            .try_get("is_active")
            .map_err(|e| backend_err("Failed to read poll", e))?,
    })
}

fn vote_from_row(row: &SqliteRow) -> StoreResult<Vote> {
    let choice: i64 = row
        .try_get("choice")
        .map_err(|e| backend_err("Failed to read vote", e))?;
    let choice = usize::try_from(choice)
        .map_err(|_| StoreError::Codec(format!("Negative vote choice: {}", choice)))?;

    Ok(Vote {
        poll_id: row
            .try_get("poll_id")
            .map_err(|e| backend_err("Failed to read vote", e))?,
        user_id: row
            .try_get("user_id")
            .map_err(|e| backend_err("Failed to read vote", e))?,
        choice,
    })
}

#[async_trait]
impl PollStore for SqliteStore {
    async fn insert_poll(&self, poll: &Poll) -> StoreResult<()> {
        let options =
            serde_json::to_string(&poll.options).map_err(|e| StoreError::Codec(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO polls (id, owner_id, question, options, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&poll.id)
        .bind(&poll.owner_id)
        .bind(&poll.question)
        .bind(&options)
        .bind(poll.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::Conflict {
                key: poll.id.clone(),
            },
            e => backend_err("Failed to insert poll", e),
        })?;

        Ok(())
    }

    async fn get_poll(&self, poll_id: &str) -> StoreResult<Poll> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, question, options, is_active
            FROM polls
            WHERE id = ?1
            "#,
        )
        .bind(poll_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend_err("Failed to get poll", e))?
        .ok_or(StoreError::NotFound)?;

        poll_from_row(&row)
    }

    async fn delete_poll(&self, poll_id: &str, with_votes: bool) -> StoreResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| backend_err("Failed to begin delete", e))?;

        sqlx::query("DELETE FROM polls WHERE id = ?1")
            .bind(poll_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| backend_err("Failed to delete poll", e))?;

        let removed = if with_votes {
            sqlx::query("DELETE FROM votes WHERE poll_id = ?1")
                .bind(poll_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| backend_err("Failed to delete votes", e))?
                .rows_affected()
        } else {
            0
        };

        // Dropping `tx` on an early return rolls both deletes back
        tx.commit()
            .await
            .map_err(|e| backend_err("Failed to commit delete", e))?;

        Ok(removed)
    }

    async fn update_poll_active(&self, poll_id: &str, is_active: bool) -> StoreResult<()> {
        sqlx::query("UPDATE polls SET is_active = ?1 WHERE id = ?2")
            .bind(is_active)
            .bind(poll_id)
            .execute(&self.pool)
            .await
            .map_err(|e| backend_err("Failed to update poll", e))?;
        Ok(())
    }

    async fn get_vote(&self, poll_id: &str, user_id: &str) -> StoreResult<Vote> {
        let row = sqlx::query(
            r#"
            SELECT poll_id, user_id, choice
            FROM votes
            WHERE poll_id = ?1 AND user_id = ?2
            "#,
        )
        .bind(poll_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend_err("Failed to get vote", e))?
        .ok_or(StoreError::NotFound)?;

        vote_from_row(&row)
    }

    async fn upsert_vote(&self, poll_id: &str, user_id: &str, choice: usize) -> StoreResult<()> {
        let choice = i64::try_from(choice)
            .map_err(|_| StoreError::Codec(format!("Vote choice out of range: {}", choice)))?;

        sqlx::query(
            r#"
            INSERT INTO votes (poll_id, user_id, choice)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (poll_id, user_id) DO UPDATE SET choice = excluded.choice
            "#,
        )
        .bind(poll_id)
        .bind(user_id)
        .bind(choice)
        .execute(&self.pool)
        .await
        .map_err(|e| backend_err("Failed to upsert vote", e))?;

        Ok(())
    }

    async fn scan_votes_for_poll(&self, poll_id: &str) -> StoreResult<Vec<Vote>> {
        let rows = sqlx::query(
            r#"
            SELECT poll_id, user_id, choice
            FROM votes
            WHERE poll_id = ?1
            "#,
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| backend_err("Failed to scan votes", e))?;

        rows.iter().map(vote_from_row).collect()
    }
}
