// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Musebot workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a Telegram chat, used as the key for all per-chat state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored topic. Immutable once persisted; titles are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: i64,
    pub title: String,
}

/// The output of one generation run: long-form text plus two image references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPost {
    pub text: String,
    pub image1_url: String,
    pub image2_url: String,
}

/// The single outstanding post held for a chat.
///
/// `publish_at` absent means "awaiting manual publish"; present means the
/// scheduler will pick the post up once the instant arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPost {
    pub text: String,
    pub image1_url: String,
    pub image2_url: String,
    pub publish_at: Option<DateTime<Utc>>,
}

/// An in-flight edit: the user pressed Edit on message `message_id` showing
/// `text`, and the next plain-text message from that chat replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub text: String,
    pub message_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_id_display_and_hash() {
        let a = ChatId(42);
        let b = ChatId(42);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "42");

        let mut set = std::collections::HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn chat_id_serializes_as_plain_integer() {
        let json = serde_json::to_string(&ChatId(-1001234)).unwrap();
        assert_eq!(json, "-1001234");
        let parsed: ChatId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ChatId(-1001234));
    }

    #[test]
    fn pending_post_unscheduled_by_default_shape() {
        let post = PendingPost {
            text: "text".into(),
            image1_url: "https://example.com/1.png".into(),
            image2_url: "https://example.com/2.png".into(),
            publish_at: None,
        };
        assert!(post.publish_at.is_none());
    }
}
