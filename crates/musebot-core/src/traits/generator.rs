// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generative capability traits: one-shot text and image synthesis.

use async_trait::async_trait;

use crate::error::MusebotError;

/// One-shot chat-style text completion.
#[async_trait]
pub trait TextGenerator {
    /// Generate a long-form text from a fully built prompt.
    ///
    /// Fails with [`MusebotError::Generation`] on transport or HTTP errors
    /// and [`MusebotError::EmptyResponse`] when the upstream returns zero
    /// choices.
    async fn generate_text(&self, prompt: &str) -> Result<String, MusebotError>;
}

/// One-shot image synthesis returning a retrievable URL.
#[async_trait]
pub trait ImageGenerator {
    /// Generate one image from `prompt` and return its URL.
    ///
    /// Fails with [`MusebotError::ImageGeneration`] on transport errors or
    /// an empty result set.
    async fn generate_image(&self, prompt: &str) -> Result<String, MusebotError>;
}
