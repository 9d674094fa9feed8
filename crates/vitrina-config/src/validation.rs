// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation.
//!
//! Figment/serde catch type errors and unknown fields; this module catches
//! values that deserialize fine but make no operational sense (zero-glyph
//! animations, non-positive costs, and the like). All violations are
//! collected so the operator sees everything in one run.

use thiserror::Error;

use crate::model::VitrinaConfig;

/// A single configuration validation failure.
#[derive(Debug, Error)]
#[error("config: {field}: {message}")]
pub struct ConfigError {
    /// Dotted path of the offending field (e.g. `economy.generation_cost`).
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Returns all violations at once rather than failing on the first.
pub fn validate_config(config: &VitrinaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !VALID_LOG_LEVELS.contains(&config.bot.log_level.as_str()) {
        errors.push(ConfigError::new(
            "bot.log_level",
            format!(
                "'{}' is not a log level (expected one of: {})",
                config.bot.log_level,
                VALID_LOG_LEVELS.join(", ")
            ),
        ));
    }

    if config.economy.starting_balance < 0 {
        errors.push(ConfigError::new(
            "economy.starting_balance",
            "must not be negative",
        ));
    }
    if config.economy.generation_cost <= 0 {
        errors.push(ConfigError::new(
            "economy.generation_cost",
            "must be positive",
        ));
    }
    if config.economy.analysis_cost <= 0 {
        errors.push(ConfigError::new(
            "economy.analysis_cost",
            "must be positive",
        ));
    }

    if config.limits.max_reference_images == 0 {
        errors.push(ConfigError::new(
            "limits.max_reference_images",
            "must be at least 1",
        ));
    }
    if config.limits.max_media_bytes == 0 {
        errors.push(ConfigError::new(
            "limits.max_media_bytes",
            "must be positive",
        ));
    }

    if config.progress.glyphs.is_empty() {
        errors.push(ConfigError::new(
            "progress.glyphs",
            "needs at least one glyph",
        ));
    }
    if config.progress.interval_ms == 0 {
        errors.push(ConfigError::new(
            "progress.interval_ms",
            "must be positive",
        ));
    }

    if config.backend.base_url.is_empty() {
        errors.push(ConfigError::new("backend.base_url", "must not be empty"));
    }
    if config.backend.timeout_secs == 0 {
        errors.push(ConfigError::new("backend.timeout_secs", "must be positive"));
    }

    if config.storage.database_path.is_empty() {
        errors.push(ConfigError::new(
            "storage.database_path",
            "must not be empty",
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Render validation errors to stderr, one per line.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprintln!("error: {error}");
    }
}
