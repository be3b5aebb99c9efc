// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response shapes for the OpenAI-compatible endpoints.

use serde::{Deserialize, Serialize};

/// A chat message in a completion request or response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Body of a `POST /chat/completions` request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// One completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

/// Body of a `POST /chat/completions` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

/// Body of a `POST /images/generations` request.
#[derive(Debug, Clone, Serialize)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub n: u32,
    pub size: String,
}

/// One generated image reference.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageDatum {
    pub url: String,
}

/// Body of a `POST /images/generations` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageResponse {
    pub data: Vec<ImageDatum>,
}
