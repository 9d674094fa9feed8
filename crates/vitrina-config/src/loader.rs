// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./vitrina.toml` > `~/.config/vitrina/vitrina.toml`
//! > `/etc/vitrina/vitrina.toml` with environment variable overrides via the
//! `VITRINA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::VitrinaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/vitrina/vitrina.toml` (system-wide)
/// 3. `~/.config/vitrina/vitrina.toml` (user XDG config)
/// 4. `./vitrina.toml` (local directory)
/// 5. `VITRINA_*` environment variables
pub fn load_config() -> Result<VitrinaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VitrinaConfig::default()))
        .merge(Toml::file("/etc/vitrina/vitrina.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("vitrina/vitrina.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("vitrina.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<VitrinaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VitrinaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<VitrinaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(VitrinaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `VITRINA_TELEGRAM_BOT_TOKEN` must map to
/// `telegram.bot_token`, not `telegram.bot.token`. Only the leading section
/// name is split off, so key names containing section words stay intact.
fn env_provider() -> Env {
    const SECTIONS: &[&str] = &[
        "telegram", "backend", "economy", "limits", "progress", "storage", "bot",
    ];

    Env::prefixed("VITRINA_").map(|key| {
        let key_str = key.as_str();
        for section in SECTIONS {
            if let Some(rest) = key_str.strip_prefix(section) {
                if let Some(rest) = rest.strip_prefix('_') {
                    return format!("{section}.{rest}").into();
                }
            }
        }
        key_str.to_string().into()
    })
}
