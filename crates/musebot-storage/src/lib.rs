// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the durable topic log.
//!
//! Topics are append-only with unique titles. All access goes through
//! tokio-rusqlite's single background connection thread, so writes are
//! serialized without explicit locking.

use musebot_core::types::Topic;
use musebot_core::MusebotError;
use tracing::debug;

/// Map a tokio-rusqlite error into the storage error variant.
fn map_storage_err(e: tokio_rusqlite::Error) -> MusebotError {
    MusebotError::Storage {
        source: Box::new(e),
    }
}

/// Durable topic log backed by SQLite.
#[derive(Clone)]
pub struct TopicStore {
    conn: tokio_rusqlite::Connection,
}

impl TopicStore {
    /// Open (or create) the topic database at `path` and ensure the schema.
    pub async fn open(path: &str) -> Result<Self, MusebotError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| map_storage_err(e.into()))?;

        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 CREATE TABLE IF NOT EXISTS topics (
                     id INTEGER PRIMARY KEY AUTOINCREMENT,
                     title TEXT NOT NULL UNIQUE
                 );",
            )?;
            Ok(())
        })
        .await
        .map_err(map_storage_err)?;

        debug!(path, "topic store opened");
        Ok(Self { conn })
    }

    /// Open an in-memory topic store (tests).
    pub async fn open_in_memory() -> Result<Self, MusebotError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| map_storage_err(e.into()))?;
        conn.call(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS topics (
                     id INTEGER PRIMARY KEY AUTOINCREMENT,
                     title TEXT NOT NULL UNIQUE
                 );",
            )?;
            Ok(())
        })
        .await
        .map_err(map_storage_err)?;
        Ok(Self { conn })
    }

    /// Persist a new topic title.
    ///
    /// Titles are stored trimmed. Fails with [`MusebotError::AlreadyExists`]
    /// when the title is already in the log and
    /// [`MusebotError::EmptyInput`] when it trims to nothing.
    pub async fn save(&self, title: &str) -> Result<(), MusebotError> {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(MusebotError::EmptyInput("topic title"));
        }

        let title_for_insert = title.clone();
        let inserted: bool = self
            .conn
            .call(move |conn| {
                // Existence check and insert in one connection call; the
                // single-writer thread makes the pair race-free.
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM topics WHERE title = ?1",
                    rusqlite::params![title_for_insert],
                    |row| row.get(0),
                )?;
                if count > 0 {
                    return Ok(false);
                }
                conn.execute(
                    "INSERT INTO topics (title) VALUES (?1)",
                    rusqlite::params![title_for_insert],
                )?;
                Ok(true)
            })
            .await
            .map_err(map_storage_err)?;

        if inserted {
            Ok(())
        } else {
            Err(MusebotError::AlreadyExists(title))
        }
    }

    /// List the most recently added topics, newest first.
    pub async fn list(&self, limit: usize) -> Result<Vec<Topic>, MusebotError> {
        let limit = limit as i64;
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, title FROM topics ORDER BY id DESC LIMIT ?1",
                )?;
                let rows = stmt.query_map(rusqlite::params![limit], |row| {
                    Ok(Topic {
                        id: row.get(0)?,
                        title: row.get(1)?,
                    })
                })?;
                let mut topics = Vec::new();
                for topic in rows {
                    topics.push(topic?);
                }
                Ok(topics)
            })
            .await
            .map_err(map_storage_err)
    }
}
