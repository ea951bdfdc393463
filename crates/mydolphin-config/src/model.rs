// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key fails
//! at startup instead of being silently ignored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MyDolphinConfig {
    /// Where the shared store document lives.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Legacy key artifacts and the migration marker.
    #[serde(default)]
    pub legacy: LegacyConfig,

    /// Entry presentation defaults.
    #[serde(default)]
    pub entry: EntryConfig,

    /// Log filtering.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage location settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Host configuration directory. Legacy key files are looked up here.
    #[serde(default = "default_config_dir")]
    pub config_dir: String,

    /// Directory for store documents, relative to `config_dir` unless absolute.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,

    /// Identifier of the shared multi-tenant document.
    #[serde(default = "default_document_key")]
    pub document_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            storage_dir: default_storage_dir(),
            document_key: default_document_key(),
        }
    }
}

impl StorageConfig {
    /// Absolute or `config_dir`-relative directory holding store documents.
    pub fn storage_path(&self) -> PathBuf {
        resolve(Path::new(&self.config_dir), &self.storage_dir)
    }
}

fn default_config_dir() -> String {
    ".".to_string()
}

fn default_storage_dir() -> String {
    ".storage".to_string()
}

fn default_document_key() -> String {
    "mydolphin_plus.config".to_string()
}

/// Legacy key migration settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LegacyConfig {
    /// Whether the legacy key importer runs at all.
    #[serde(default = "default_legacy_enabled")]
    pub enabled: bool,

    /// Legacy key file, relative to `storage.config_dir` unless absolute.
    #[serde(default = "default_legacy_key_file")]
    pub key_file: String,

    /// Identifier of the legacy single-tenant store document.
    #[serde(default = "default_legacy_store_key")]
    pub store_key: String,

    /// Marker recording that the migration already ran, relative to the
    /// storage directory unless absolute.
    #[serde(default = "default_marker_file")]
    pub marker_file: String,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            enabled: default_legacy_enabled(),
            key_file: default_legacy_key_file(),
            store_key: default_legacy_store_key(),
            marker_file: default_marker_file(),
        }
    }
}

impl LegacyConfig {
    pub fn key_file_path(&self, storage: &StorageConfig) -> PathBuf {
        resolve(Path::new(&storage.config_dir), &self.key_file)
    }

    pub fn marker_path(&self, storage: &StorageConfig) -> PathBuf {
        resolve(&storage.storage_path(), &self.marker_file)
    }
}

fn default_legacy_enabled() -> bool {
    true
}

fn default_legacy_key_file() -> String {
    ".mydolphin_plus.key".to_string()
}

fn default_legacy_store_key() -> String {
    ".mydolphin_plus".to_string()
}

fn default_marker_file() -> String {
    ".mydolphin_plus.migrated".to_string()
}

/// Entry presentation defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EntryConfig {
    /// Title used by managers that are not bound to a configured entry.
    #[serde(default = "default_entry_name")]
    pub default_name: String,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            default_name: default_entry_name(),
        }
    }
}

fn default_entry_name() -> String {
    mydolphin_core::DEFAULT_NAME.to_string()
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn resolve(base: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    }
}
