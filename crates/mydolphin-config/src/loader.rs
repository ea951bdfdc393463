// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered settings loading with Figment.
//!
//! Lookup order: `./mydolphin.toml` > `~/.config/mydolphin/mydolphin.toml` >
//! `/etc/mydolphin/mydolphin.toml`, with `MYDOLPHIN_` environment overrides
//! on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MyDolphinConfig;

const SYSTEM_CONFIG: &str = "/etc/mydolphin/mydolphin.toml";
const LOCAL_CONFIG: &str = "mydolphin.toml";

/// Load settings from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/mydolphin/mydolphin.toml`
/// 3. `~/.config/mydolphin/mydolphin.toml`
/// 4. `./mydolphin.toml`
/// 5. `MYDOLPHIN_*` environment variables
pub fn load_config() -> Result<MyDolphinConfig, figment::Error> {
    build_figment().extract()
}

/// Load settings from an inline TOML string only. No files, no env.
pub fn load_config_from_str(toml_content: &str) -> Result<MyDolphinConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MyDolphinConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load settings from one file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MyDolphinConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MyDolphinConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment behind [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MyDolphinConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

pub(crate) fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("mydolphin/mydolphin.toml"))
}

pub(crate) fn system_config_path() -> &'static Path {
    Path::new(SYSTEM_CONFIG)
}

pub(crate) fn local_config_path() -> &'static Path {
    Path::new(LOCAL_CONFIG)
}

/// Environment provider mapping the first underscore to a section dot.
///
/// Uses `Env::map()` rather than `Env::split("_")` because field names contain
/// underscores: `MYDOLPHIN_STORAGE_DOCUMENT_KEY` must become
/// `storage.document_key`, not `storage.document.key`.
fn env_provider() -> Env {
    Env::prefixed("MYDOLPHIN_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("storage_", "storage.", 1)
            .replacen("legacy_", "legacy.", 1)
            .replacen("entry_", "entry.", 1)
            .replacen("logging_", "logging.", 1);
        mapped.into()
    })
}
