// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./musebot.toml` > `~/.config/musebot/musebot.toml`
//! > `/etc/musebot/musebot.toml`, with environment variable overrides via the
//! `MUSEBOT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MusebotConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/musebot/musebot.toml` (system-wide)
/// 3. `~/.config/musebot/musebot.toml` (user XDG config)
/// 4. `./musebot.toml` (local directory)
/// 5. `MUSEBOT_*` environment variables
pub fn load_config() -> Result<MusebotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MusebotConfig::default()))
        .merge(Toml::file("/etc/musebot/musebot.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("musebot/musebot.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("musebot.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<MusebotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MusebotConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MusebotConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MusebotConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `MUSEBOT_TELEGRAM_BOT_TOKEN` must map to
/// `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("MUSEBOT_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: MUSEBOT_TELEGRAM_BOT_TOKEN -> "telegram_bot_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("telegram_", "telegram.", 1)
            .replacen("openai_", "openai.", 1)
            .replacen("scheduler_", "scheduler.", 1)
            .replacen("storage_", "storage.", 1);
        mapped.into()
    })
}
