// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible generation for the Musebot posting bot.
//!
//! [`OpenAiClient`] implements the [`TextGenerator`] and [`ImageGenerator`]
//! capability traits over the chat-completions and image-generation
//! endpoints; [`GenerationPipeline`] chains them into one topic-to-post run.
//!
//! [`TextGenerator`]: musebot_core::TextGenerator
//! [`ImageGenerator`]: musebot_core::ImageGenerator

pub mod client;
pub mod pipeline;
pub mod types;

pub use client::OpenAiClient;
pub use pipeline::GenerationPipeline;
