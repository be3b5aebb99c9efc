// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Musebot posting bot.
//!
//! Provides the shared error type, domain types (chats, topics, pending
//! posts), caption truncation, and the capability traits the core consumes.
//! Transport crates (OpenAI clients, Telegram adapter) implement the traits
//! defined here.

pub mod caption;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use caption::{exceeds_caption_limit, truncate_caption};
pub use error::MusebotError;
pub use traits::{ImageGenerator, MediaPublisher, TextGenerator};
pub use types::{ChatId, GeneratedPost, PendingEdit, PendingPost, Topic};
