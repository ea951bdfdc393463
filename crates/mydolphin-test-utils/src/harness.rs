// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` owns a temp host configuration directory, settings pointing
//! into it, and in-memory stores for the shared document and the legacy
//! single-tenant document. Everything is cleaned up on drop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mydolphin_config::model::{LegacyConfig, MyDolphinConfig, StorageConfig};
use mydolphin_core::MyDolphinError;

use crate::memory_store::MemoryStore;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    legacy_enabled: bool,
    legacy_key_file: Option<String>,
    legacy_store_key: Option<String>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            legacy_enabled: true,
            legacy_key_file: None,
            legacy_store_key: None,
        }
    }

    /// Turn the legacy key importer off.
    pub fn without_legacy(mut self) -> Self {
        self.legacy_enabled = false;
        self
    }

    /// Write a legacy key file with these contents before the test runs.
    pub fn with_legacy_key_file(mut self, contents: impl Into<String>) -> Self {
        self.legacy_key_file = Some(contents.into());
        self
    }

    /// Seed the legacy single-tenant store with `{"key": <key>}`.
    pub fn with_legacy_store_key(mut self, key: impl Into<String>) -> Self {
        self.legacy_store_key = Some(key.into());
        self
    }

    /// Build the test harness.
    pub async fn build(self) -> Result<TestHarness, MyDolphinError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| MyDolphinError::store("<harness>", e))?;

        let config = MyDolphinConfig {
            storage: StorageConfig {
                config_dir: temp_dir.path().display().to_string(),
                ..StorageConfig::default()
            },
            legacy: LegacyConfig {
                enabled: self.legacy_enabled,
                ..LegacyConfig::default()
            },
            ..MyDolphinConfig::default()
        };

        let shared_store = Arc::new(MemoryStore::new(config.storage.document_key.clone()));
        let legacy_store = Arc::new(MemoryStore::new(config.legacy.store_key.clone()));

        let harness = TestHarness {
            config,
            shared_store,
            legacy_store,
            temp_dir,
        };

        if let Some(contents) = self.legacy_key_file {
            harness.write_legacy_key_file(&contents)?;
        }
        if let Some(key) = self.legacy_store_key {
            harness
                .legacy_store
                .seed(serde_json::json!({ "key": key }))
                .await;
        }

        Ok(harness)
    }
}

/// A temp host environment for store and manager tests.
pub struct TestHarness {
    /// Settings rooted in the temp directory.
    pub config: MyDolphinConfig,
    /// Stand-in for the shared multi-tenant document.
    pub shared_store: Arc<MemoryStore>,
    /// Stand-in for the legacy single-tenant document.
    pub legacy_store: Arc<MemoryStore>,
    /// Temp directory kept alive for cleanup on drop.
    temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn config_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn legacy_key_file(&self) -> PathBuf {
        self.config.legacy.key_file_path(&self.config.storage)
    }

    pub fn marker_path(&self) -> PathBuf {
        self.config.legacy.marker_path(&self.config.storage)
    }

    /// Create or overwrite the legacy key file.
    pub fn write_legacy_key_file(&self, contents: &str) -> Result<(), MyDolphinError> {
        let path = self.legacy_key_file();
        std::fs::write(&path, contents)
            .map_err(|e| MyDolphinError::store(path.display().to_string(), e))
    }
}
