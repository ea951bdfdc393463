// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for semantic constraints serde cannot
//! express.

use crate::diagnostic::ConfigError;
use crate::model::MyDolphinConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &MyDolphinConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let required = [
        ("storage.config_dir", &config.storage.config_dir),
        ("storage.storage_dir", &config.storage.storage_dir),
        ("storage.document_key", &config.storage.document_key),
        ("entry.default_name", &config.entry.default_name),
    ];
    for (key, value) in required {
        if value.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("{key} must not be empty"),
            });
        }
    }

    if config.legacy.enabled {
        let legacy_required = [
            ("legacy.key_file", &config.legacy.key_file),
            ("legacy.store_key", &config.legacy.store_key),
            ("legacy.marker_file", &config.legacy.marker_file),
        ];
        for (key, value) in legacy_required {
            if value.trim().is_empty() {
                errors.push(ConfigError::Validation {
                    message: format!("{key} must not be empty while legacy.enabled is true"),
                });
            }
        }

        if config.legacy.store_key == config.storage.document_key {
            errors.push(ConfigError::Validation {
                message: format!(
                    "legacy.store_key `{}` must differ from storage.document_key; \
                     importing would delete the shared document",
                    config.legacy.store_key
                ),
            });
        }
    }

    for key in [&config.storage.document_key, &config.legacy.store_key] {
        if key.contains('/') || key.contains('\\') {
            errors.push(ConfigError::Validation {
                message: format!("store key `{key}` must be a file name, not a path"),
            });
        }
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{}` is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
