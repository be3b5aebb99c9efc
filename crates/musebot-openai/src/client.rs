// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI-compatible chat-completions and
//! image-generation endpoints.
//!
//! Handles request construction, bearer authentication, and error surfacing.
//! Non-2xx responses carry the response body in the error message so upstream
//! failures are diagnosable from the log alone.

use std::time::Duration;

use async_trait::async_trait;
use musebot_config::model::OpenAiConfig;
use musebot_core::{ImageGenerator, MusebotError, TextGenerator};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use crate::types::{ChatMessage, ChatRequest, ChatResponse, ImageRequest, ImageResponse};

/// Fixed system message for the text-generation endpoint.
const SYSTEM_PROMPT: &str =
    "You are an assistant that writes creative, engaging texts for Telegram channel posts.";

/// HTTP client for OpenAI-compatible generation APIs.
///
/// One client serves both the text and the image endpoint; the base URL is
/// configurable so self-hosted compatible APIs (and test servers) work.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    text_model: String,
    image_model: String,
    image_size: String,
    max_tokens: u32,
    temperature: f64,
}

impl OpenAiClient {
    /// Creates a new client from config.
    ///
    /// Requires `config.api_key` to be set.
    pub fn new(config: &OpenAiConfig) -> Result<Self, MusebotError> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| MusebotError::Config("openai.api_key is required".into()))?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| MusebotError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MusebotError::Generation {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            image_size: config.image_size.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String, MusebotError> {
        let request = ChatRequest {
            model: self.text_model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: prompt.to_string(),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| MusebotError::Generation {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "chat completion response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MusebotError::Generation {
                message: format!("API returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: ChatResponse =
            response.json().await.map_err(|e| MusebotError::Generation {
                message: format!("failed to parse API response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let choice = parsed.choices.into_iter().next().ok_or(MusebotError::EmptyResponse)?;
        Ok(choice.message.content)
    }
}

#[async_trait]
impl ImageGenerator for OpenAiClient {
    async fn generate_image(&self, prompt: &str) -> Result<String, MusebotError> {
        let request = ImageRequest {
            model: self.image_model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: self.image_size.clone(),
        };

        let url = format!("{}/images/generations", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| MusebotError::ImageGeneration {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "image generation response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MusebotError::ImageGeneration {
                message: format!("API returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: ImageResponse =
            response
                .json()
                .await
                .map_err(|e| MusebotError::ImageGeneration {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                })?;

        let datum = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| MusebotError::ImageGeneration {
                message: "API returned an empty image set".into(),
                source: None,
            })?;
        Ok(datum.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> OpenAiClient {
        let config = OpenAiConfig {
            api_key: Some("test-api-key".into()),
            ..OpenAiConfig::default()
        };
        OpenAiClient::new(&config)
            .unwrap()
            .with_base_url(base_url.to_string())
    }

    fn chat_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-test",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": content}}
            ]
        })
    }

    #[tokio::test]
    async fn generate_text_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-api-key"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("A long post.")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let text = client.generate_text("write about rain").await.unwrap();
        assert_eq!(text, "A long post.");
    }

    #[tokio::test]
    async fn generate_text_sends_system_and_user_messages() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4",
                "max_tokens": 800,
                "messages": [
                    {"role": "system"},
                    {"role": "user", "content": "write about rain"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("ok")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.generate_text("write about rain").await;
        assert!(result.is_ok(), "request shape should match: {result:?}");
    }

    #[tokio::test]
    async fn generate_text_empty_choices_is_empty_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.generate_text("topic").await.unwrap_err();
        assert!(matches!(err, MusebotError::EmptyResponse));
    }

    #[tokio::test]
    async fn generate_text_surfaces_status_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(serde_json::json!({"error": {"message": "rate limited"}})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.generate_text("topic").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("429"), "got: {msg}");
    }

    #[tokio::test]
    async fn generate_image_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .and(body_partial_json(serde_json::json!({
                "model": "dall-e-3",
                "n": 1,
                "size": "512x768",
                "prompt": "a red door"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "created": 1700000000,
                "data": [{"url": "https://img.example/1.png"}]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let url = client.generate_image("a red door").await.unwrap();
        assert_eq!(url, "https://img.example/1.png");
    }

    #[tokio::test]
    async fn generate_image_empty_data_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"created": 1, "data": []})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.generate_image("prompt").await.unwrap_err();
        assert!(matches!(err, MusebotError::ImageGeneration { .. }));
    }

    #[test]
    fn new_requires_api_key() {
        let config = OpenAiConfig::default();
        assert!(OpenAiClient::new(&config).is_err());
    }
}
