// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Musebot posting bot.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// The primary error type used across all Musebot crates.
#[derive(Debug, Error)]
pub enum MusebotError {
    /// A required input string was empty.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// An operation referenced per-chat state that does not exist.
    #[error("not found: {0}")]
    NotFound(&'static str),

    /// A requested publish time falls before the allowed grace window.
    #[error("publish time {requested} is in the past (now: {now})")]
    PastSchedule {
        requested: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    /// Text generation failed (transport, HTTP status, or malformed body).
    #[error("text generation failed: {message}")]
    Generation {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The text generation API returned zero choices.
    #[error("text generation returned an empty response")]
    EmptyResponse,

    /// Image generation failed (transport, HTTP status, or empty result).
    #[error("image generation failed: {message}")]
    ImageGeneration {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Publishing to the channel failed.
    #[error("publish failed: {message}")]
    Publish {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A topic with the same title is already stored.
    #[error("topic already exists: {0}")]
    AlreadyExists(String),

    /// Configuration errors (missing token, invalid zone, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database open, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat platform errors (send failure, download failure, bad identifiers).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_stable() {
        let err = MusebotError::EmptyInput("post text");
        assert_eq!(err.to_string(), "empty input: post text");

        let err = MusebotError::NotFound("pending post");
        assert_eq!(err.to_string(), "not found: pending post");

        let err = MusebotError::AlreadyExists("evening rain".into());
        assert_eq!(err.to_string(), "topic already exists: evening rain");
    }

    #[test]
    fn past_schedule_reports_both_instants() {
        let now = Utc::now();
        let requested = now - chrono::Duration::minutes(10);
        let err = MusebotError::PastSchedule { requested, now };
        let msg = err.to_string();
        assert!(msg.contains("in the past"), "got: {msg}");
    }

    #[test]
    fn wrapped_sources_are_preserved() {
        let err = MusebotError::Generation {
            message: "HTTP request failed".into(),
            source: Some(Box::new(std::io::Error::other("connection reset"))),
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}
