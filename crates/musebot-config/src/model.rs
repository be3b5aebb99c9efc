// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Musebot posting bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Musebot configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values; secrets (bot token, API key) have no defaults and are validated
/// at serve time.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MusebotConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Telegram bot and target channel settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// OpenAI-compatible generation API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Publish scheduler settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Topic storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the bot process.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "musebot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Bot API token. Required for `serve`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Chat ID of the channel all posts are published to. Required for `serve`.
    #[serde(default)]
    pub channel_id: Option<i64>,

    /// User IDs or usernames allowed to drive the bot. Empty means everyone
    /// may (operator bots are typically private, so set this).
    #[serde(default)]
    pub allowed_users: Vec<String>,
}

/// OpenAI-compatible API configuration for text and image generation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. Required for `serve`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the API (without trailing slash).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for text generation.
    #[serde(default = "default_text_model")]
    pub text_model: String,

    /// Model used for image generation.
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Image size requested from the image endpoint.
    #[serde(default = "default_image_size")]
    pub image_size: String,

    /// Maximum tokens for text generation.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature for text generation.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Request timeout in seconds for both endpoints.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            image_size: default_image_size(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_text_model() -> String {
    "gpt-4".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_image_size() -> String {
    "512x768".to_string()
}

fn default_max_tokens() -> u32 {
    800
}

fn default_temperature() -> f64 {
    0.8
}

fn default_timeout_secs() -> u64 {
    120
}

/// Publish scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Seconds between due-post scans.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// Grace window in minutes: a schedule request this far in the past is
    /// still accepted as "now-ish".
    #[serde(default = "default_grace_minutes")]
    pub grace_minutes: i64,

    /// IANA time-zone name used for parsing and formatting publish instants.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Maximum caption length accepted by the publish surface.
    #[serde(default = "default_caption_limit")]
    pub caption_limit: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            grace_minutes: default_grace_minutes(),
            timezone: default_timezone(),
            caption_limit: default_caption_limit(),
        }
    }
}

fn default_tick_secs() -> u64 {
    10
}

fn default_grace_minutes() -> i64 {
    2
}

fn default_timezone() -> String {
    "Asia/Novosibirsk".to_string()
}

fn default_caption_limit() -> usize {
    1024
}

/// Topic storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file holding the topic log.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Maximum number of topics returned by a listing.
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            list_limit: default_list_limit(),
        }
    }
}

fn default_database_path() -> String {
    "musebot.db".to_string()
}

fn default_list_limit() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_observed_constants() {
        let config = MusebotConfig::default();
        assert_eq!(config.scheduler.tick_secs, 10);
        assert_eq!(config.scheduler.grace_minutes, 2);
        assert_eq!(config.scheduler.caption_limit, 1024);
        assert_eq!(config.scheduler.timezone, "Asia/Novosibirsk");
        assert_eq!(config.openai.max_tokens, 800);
        assert_eq!(config.openai.temperature, 0.8);
        assert_eq!(config.storage.list_limit, 50);
    }

    #[test]
    fn secrets_default_to_none() {
        let config = MusebotConfig::default();
        assert!(config.telegram.bot_token.is_none());
        assert!(config.telegram.channel_id.is_none());
        assert!(config.openai.api_key.is_none());
    }
}
