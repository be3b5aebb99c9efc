// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-keyed mutable state for the pending-post lifecycle.
//!
//! [`PendingStore`] owns three per-chat maps behind one reader/writer lock:
//! the pending edit, the pending post, and the awaiting-schedule flag.
//! Callers only ever receive clones of the stored values; no handle into the
//! maps escapes the lock. No operation performs I/O while holding the lock,
//! so hold times are bounded by in-memory map work.
//!
//! The linchpin operation is [`PendingStore::take_due_posts`]: one atomic
//! scan-and-remove under the write lock, which is what makes a due post
//! observable in exactly one scheduler tick.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use musebot_core::types::{ChatId, PendingEdit, PendingPost};
use musebot_core::MusebotError;
use tracing::debug;

#[derive(Debug, Default)]
struct Inner {
    edits: HashMap<ChatId, PendingEdit>,
    posts: HashMap<ChatId, PendingPost>,
    awaiting_schedule: HashSet<ChatId>,
}

/// Concurrent store for per-chat pending state.
///
/// At most one pending post and one pending edit exist per chat; saves fully
/// replace earlier state.
#[derive(Debug)]
pub struct PendingStore {
    inner: RwLock<Inner>,
    /// Tolerance for "now-ish" schedule requests: a requested publish instant
    /// older than `now - grace` is rejected as already past.
    grace: Duration,
}

impl Default for PendingStore {
    fn default() -> Self {
        Self::new(Duration::minutes(2))
    }
}

impl PendingStore {
    /// Create a store with the given grace window for past-schedule checks.
    pub fn new(grace: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            grace,
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Save a pending edit for `chat`, replacing any existing one.
    pub fn save_edit(
        &self,
        chat: ChatId,
        text: &str,
        message_id: i32,
    ) -> Result<(), MusebotError> {
        if text.is_empty() {
            return Err(MusebotError::EmptyInput("edit text"));
        }
        self.write().edits.insert(
            chat,
            PendingEdit {
                text: text.to_string(),
                message_id,
            },
        );
        Ok(())
    }

    /// Read the pending edit for `chat` without clearing it.
    ///
    /// Consumers call [`clear_edit`](Self::clear_edit) explicitly once the
    /// replacement text has been applied.
    pub fn take_edit(&self, chat: ChatId) -> Result<PendingEdit, MusebotError> {
        self.read()
            .edits
            .get(&chat)
            .cloned()
            .ok_or(MusebotError::NotFound("pending edit"))
    }

    /// Remove the pending edit for `chat`.
    pub fn clear_edit(&self, chat: ChatId) -> Result<(), MusebotError> {
        self.write()
            .edits
            .remove(&chat)
            .map(|_| ())
            .ok_or(MusebotError::NotFound("pending edit"))
    }

    /// Save the pending post for `chat`, fully replacing any existing one.
    ///
    /// A present `publish_at` earlier than now minus the grace window is
    /// rejected with [`MusebotError::PastSchedule`]. An absent `publish_at`
    /// ("awaiting manual publish") is always accepted.
    pub fn save_post(
        &self,
        chat: ChatId,
        text: &str,
        image1_url: &str,
        image2_url: &str,
        publish_at: Option<DateTime<Utc>>,
    ) -> Result<(), MusebotError> {
        if text.is_empty() {
            return Err(MusebotError::EmptyInput("post text"));
        }
        let now = Utc::now();
        if let Some(at) = publish_at
            && at < now - self.grace
        {
            return Err(MusebotError::PastSchedule { requested: at, now });
        }
        self.write().posts.insert(
            chat,
            PendingPost {
                text: text.to_string(),
                image1_url: image1_url.to_string(),
                image2_url: image2_url.to_string(),
                publish_at,
            },
        );
        Ok(())
    }

    /// Get a copy of the pending post for `chat`.
    pub fn get_post(&self, chat: ChatId) -> Result<PendingPost, MusebotError> {
        self.read()
            .posts
            .get(&chat)
            .cloned()
            .ok_or(MusebotError::NotFound("pending post"))
    }

    /// Remove the pending post for `chat`.
    pub fn clear_post(&self, chat: ChatId) -> Result<(), MusebotError> {
        self.write()
            .posts
            .remove(&chat)
            .map(|_| ())
            .ok_or(MusebotError::NotFound("pending post"))
    }

    /// Atomically extract every post whose publish instant is at or before
    /// `now`.
    ///
    /// Selection and removal happen under one write lock: two concurrent
    /// calls can never both return the same post. Removed posts are gone from
    /// the store regardless of what the caller does with them afterwards.
    pub fn take_due_posts(&self, now: DateTime<Utc>) -> HashMap<ChatId, PendingPost> {
        let mut inner = self.write();
        let due_chats: Vec<ChatId> = inner
            .posts
            .iter()
            .filter(|(_, post)| post.publish_at.is_some_and(|at| at <= now))
            .map(|(chat, _)| *chat)
            .collect();

        let mut due = HashMap::with_capacity(due_chats.len());
        for chat in due_chats {
            if let Some(post) = inner.posts.remove(&chat) {
                due.insert(chat, post);
            }
        }
        if !due.is_empty() {
            debug!(count = due.len(), "extracted due posts");
        }
        due
    }

    /// Mark `chat` as awaiting a date/time string from the user.
    pub fn set_awaiting_schedule(&self, chat: ChatId) {
        self.write().awaiting_schedule.insert(chat);
    }

    /// Whether `chat` is awaiting a date/time string.
    pub fn is_awaiting_schedule(&self, chat: ChatId) -> bool {
        self.read().awaiting_schedule.contains(&chat)
    }

    /// Clear the awaiting-schedule flag for `chat`.
    pub fn clear_awaiting_schedule(&self, chat: ChatId) -> Result<(), MusebotError> {
        if self.write().awaiting_schedule.remove(&chat) {
            Ok(())
        } else {
            Err(MusebotError::NotFound("awaiting-schedule flag"))
        }
    }
}
