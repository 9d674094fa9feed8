// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Vitrina bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. Every externally tunable knob lives here:
//! per-feature token costs, the starting balance, media limits, and the
//! progress indicator glyph sequence and interval.

use serde::{Deserialize, Serialize};

/// Top-level Vitrina configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VitrinaConfig {
    /// Bot identity and logging settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Telegram transport settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Generative/classification backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Token economy settings.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Media and reference-image limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Progress indicator animation settings.
    #[serde(default)]
    pub progress: ProgressConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Bot identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name of the bot.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "vitrina".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram transport configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. `None` disables the Telegram transport.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Optional allow-list of Telegram user IDs or usernames.
    /// Empty means the bot is public.
    #[serde(default)]
    pub allowed_users: Vec<String>,
}

/// Generative/classification backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// API key. `None` requires the `VITRINA_BACKEND_API_KEY` env var.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the generateContent-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for image generation.
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Model used for text generation (analysis).
    #[serde(default = "default_text_model")]
    pub text_model: String,

    /// Lightweight model used for yes/no intent classification.
    #[serde(default = "default_classifier_model")]
    pub classifier_model: String,

    /// Request timeout in seconds for backend calls.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            image_model: default_image_model(),
            text_model: default_text_model(),
            classifier_model: default_classifier_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.laozhang.ai/v1beta/models".to_string()
}

fn default_image_model() -> String {
    "gemini-3-pro-image-preview-2k".to_string()
}

fn default_text_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_classifier_model() -> String {
    "gemma-3-12b-it".to_string()
}

fn default_timeout_secs() -> u64 {
    180
}

/// Token economy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EconomyConfig {
    /// Balance granted to newly created users.
    #[serde(default = "default_starting_balance")]
    pub starting_balance: i64,

    /// Token cost of one image generation (also billed by the improvement flow).
    #[serde(default = "default_generation_cost")]
    pub generation_cost: i64,

    /// Token cost of one card analysis.
    #[serde(default = "default_analysis_cost")]
    pub analysis_cost: i64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_balance: default_starting_balance(),
            generation_cost: default_generation_cost(),
            analysis_cost: default_analysis_cost(),
        }
    }
}

fn default_starting_balance() -> i64 {
    50
}

fn default_generation_cost() -> i64 {
    10
}

fn default_analysis_cost() -> i64 {
    5
}

/// Media and reference-image limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum reference images accepted for one generation request.
    #[serde(default = "default_max_reference_images")]
    pub max_reference_images: usize,

    /// Maximum inbound media size in bytes. Larger media is rejected
    /// before any state mutation or balance change.
    #[serde(default = "default_max_media_bytes")]
    pub max_media_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_reference_images: default_max_reference_images(),
            max_media_bytes: default_max_media_bytes(),
        }
    }
}

fn default_max_reference_images() -> usize {
    5
}

fn default_max_media_bytes() -> u64 {
    7 * 1024 * 1024
}

/// Progress indicator animation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProgressConfig {
    /// Ordered glyph sequence cycled while a backend call is in flight.
    /// One full cycle bounds the total visible animation duration.
    #[serde(default = "default_glyphs")]
    pub glyphs: Vec<String>,

    /// Interval between indicator updates, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            glyphs: default_glyphs(),
            interval_ms: default_interval_ms(),
        }
    }
}

fn default_glyphs() -> Vec<String> {
    ["🕐", "🕑", "🕒", "🕓", "🕔", "🕕", "🕖", "🕗", "🕘", "🕙", "🕚", "🕛"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_interval_ms() -> u64 {
    2000
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("vitrina").join("vitrina.db"))
        .and_then(|p| p.to_str().map(|s| s.to_string()))
        .unwrap_or_else(|| "vitrina.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn economy_defaults() {
        let config = VitrinaConfig::default();
        assert_eq!(config.economy.starting_balance, 50);
        assert_eq!(config.economy.generation_cost, 10);
        assert_eq!(config.economy.analysis_cost, 5);
    }

    #[test]
    fn limits_defaults() {
        let config = VitrinaConfig::default();
        assert_eq!(config.limits.max_reference_images, 5);
        assert_eq!(config.limits.max_media_bytes, 7 * 1024 * 1024);
    }

    #[test]
    fn progress_defaults_are_a_full_clock_cycle() {
        let config = VitrinaConfig::default();
        assert_eq!(config.progress.glyphs.len(), 12);
        assert_eq!(config.progress.interval_ms, 2000);
    }
}
