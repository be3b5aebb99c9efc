// SPDX-FileCopyrightText: 2026 Musebot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as a resolvable IANA time-zone name and sane scheduler
//! periods.

use std::str::FromStr;

use crate::diagnostic::ConfigError;
use crate::model::MusebotConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MusebotConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.scheduler.tick_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "scheduler.tick_secs must be at least 1".to_string(),
        });
    }

    if config.scheduler.grace_minutes < 0 {
        errors.push(ConfigError::Validation {
            message: format!(
                "scheduler.grace_minutes must be non-negative, got {}",
                config.scheduler.grace_minutes
            ),
        });
    }

    if config.scheduler.caption_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "scheduler.caption_limit must be at least 1".to_string(),
        });
    }

    if chrono_tz::Tz::from_str(&config.scheduler.timezone).is_err() {
        errors.push(ConfigError::Validation {
            message: format!(
                "scheduler.timezone `{}` is not a known IANA time zone",
                config.scheduler.timezone
            ),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.storage.list_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "storage.list_limit must be at least 1".to_string(),
        });
    }

    if config.openai.base_url.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "openai.base_url must not be empty".to_string(),
        });
    }

    if !(0.0..=2.0).contains(&config.openai.temperature) {
        errors.push(ConfigError::Validation {
            message: format!(
                "openai.temperature must be between 0.0 and 2.0, got {}",
                config.openai.temperature
            ),
        });
    }

    // Token and key presence is a serve-time concern: config files without
    // secrets are valid for commands that never talk to the network.
    if let Some(token) = &config.telegram.bot_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "telegram.bot_token must not be empty when set".to_string(),
        });
    }

    if let Some(key) = &config.openai.api_key
        && key.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "openai.api_key must not be empty when set".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MusebotConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_tick_is_rejected() {
        let mut config = MusebotConfig::default();
        config.scheduler.tick_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("tick_secs")));
    }

    #[test]
    fn bad_timezone_is_rejected() {
        let mut config = MusebotConfig::default();
        config.scheduler.timezone = "Mars/Olympus_Mons".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("time zone")));
    }

    #[test]
    fn all_errors_are_collected_not_fail_fast() {
        let mut config = MusebotConfig::default();
        config.scheduler.tick_secs = 0;
        config.scheduler.caption_limit = 0;
        config.storage.database_path = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3, "expected all errors, got {errors:?}");
    }

    #[test]
    fn empty_set_secret_is_rejected() {
        let mut config = MusebotConfig::default();
        config.telegram.bot_token = Some(String::new());
        assert!(validate_config(&config).is_err());
    }
}
