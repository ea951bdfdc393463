// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring from settings to managers.
//!
//! A [`StoreContext`] holds the one [`SharedStore`] for the shared document
//! and the optional legacy key importer. Every manager it hands out shares
//! both, so managers of one process never race on the document.

use std::sync::Arc;

use tracing::debug;

use mydolphin_config::MyDolphinConfig;
use mydolphin_core::{DocumentStore, EntryCredentials, EntryDescriptor};
use mydolphin_storage::JsonFileStore;
use mydolphin_vault::LegacyKeyImporter;

use crate::manager::ConfigManager;
use crate::shared::SharedStore;

/// Shared store handle, legacy context, and defaults for new managers.
#[derive(Debug, Clone)]
pub struct StoreContext {
    shared: SharedStore,
    legacy: Option<Arc<LegacyKeyImporter>>,
    default_name: String,
}

impl StoreContext {
    pub fn new(
        document_store: Arc<dyn DocumentStore>,
        legacy: Option<Arc<LegacyKeyImporter>>,
        default_name: impl Into<String>,
    ) -> Self {
        Self {
            shared: SharedStore::new(document_store),
            legacy,
            default_name: default_name.into(),
        }
    }

    /// Build JSON file stores under the configured storage directory.
    pub fn from_config(config: &MyDolphinConfig) -> Self {
        let storage_path = config.storage.storage_path();
        let document_store = JsonFileStore::new(&storage_path, config.storage.document_key.clone());

        let legacy = config.legacy.enabled.then(|| {
            let legacy_store = JsonFileStore::new(&storage_path, config.legacy.store_key.clone());
            Arc::new(LegacyKeyImporter::new(
                config.legacy.key_file_path(&config.storage),
                Arc::new(legacy_store),
                config.legacy.marker_path(&config.storage),
            ))
        });

        debug!(
            document = %document_store.path().display(),
            legacy = legacy.is_some(),
            "built store context"
        );

        Self::new(
            Arc::new(document_store),
            legacy,
            config.entry.default_name.clone(),
        )
    }

    /// A manager for a configured entry.
    pub fn manager(
        &self,
        descriptor: EntryDescriptor,
        credentials: EntryCredentials,
    ) -> ConfigManager {
        ConfigManager::new(
            descriptor,
            credentials,
            self.shared.clone(),
            self.legacy.clone(),
        )
    }

    /// A manager with no durable store, titled with the default name.
    pub fn detached(&self, credentials: EntryCredentials) -> ConfigManager {
        ConfigManager::detached(credentials, self.default_name.clone())
    }
}
