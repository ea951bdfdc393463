// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key resolution for one entry.
//!
//! First success wins:
//! 1. the key stored in the entry's persisted record,
//! 2. a key imported from a legacy artifact (only when no record exists),
//! 3. a freshly generated key.
//!
//! A persisted key is never replaced: every credential token the host holds
//! was produced under it.

use mydolphin_core::{EntryId, MyDolphinError, PersistedRecord};
use tracing::{info, warn};

use crate::cipher::CipherContext;
use crate::key::EncryptionKey;
use crate::migration::{LegacyKeyImporter, MigrationOutcome, MigrationSource};

/// How a key was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    Record,
    Legacy(MigrationSource),
    Generated,
}

/// A resolved key and where it came from.
#[derive(Debug)]
pub struct ResolvedKey {
    pub key: EncryptionKey,
    pub origin: KeyOrigin,
}

impl ResolvedKey {
    /// Build the cipher context bound to this key.
    pub fn cipher(&self) -> Result<CipherContext, MyDolphinError> {
        CipherContext::new(&self.key)
    }
}

/// Resolve the encryption key for `entry_id`.
///
/// A [`MyDolphinError::Migration`] from the importer is logged and the key
/// is generated instead; any other error is returned.
pub async fn resolve_key(
    entry_id: &EntryId,
    record: Option<&PersistedRecord>,
    legacy: Option<&LegacyKeyImporter>,
) -> Result<ResolvedKey, MyDolphinError> {
    match record {
        Some(record) => match record.encryption_key.as_deref() {
            Some(material) if !material.trim().is_empty() => {
                return Ok(ResolvedKey {
                    key: EncryptionKey::from_material(material)?,
                    origin: KeyOrigin::Record,
                });
            }
            _ => {
                warn!(entry_id = %entry_id, "persisted record has no encryption key, generating one");
            }
        },
        None => {
            if let Some(importer) = legacy {
                match importer.run().await {
                    Ok(MigrationOutcome::Imported { key, source }) => {
                        return Ok(ResolvedKey {
                            key,
                            origin: KeyOrigin::Legacy(source),
                        });
                    }
                    Ok(MigrationOutcome::NothingFound | MigrationOutcome::AlreadyCompleted) => {}
                    Err(e) if e.is_migration() => {
                        warn!(entry_id = %entry_id, error = %e, "legacy key import failed, generating a new key");
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }

    let key = EncryptionKey::generate()?;
    info!(entry_id = %entry_id, "generated new encryption key");
    Ok(ResolvedKey {
        key,
        origin: KeyOrigin::Generated,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use mydolphin_test_utils::MemoryStore;
    use serde_json::json;
    use tempfile::tempdir;

    fn record_with_key(key: Option<&str>) -> PersistedRecord {
        PersistedRecord {
            encryption_key: key.map(str::to_string),
            ..PersistedRecord::default()
        }
    }

    fn importer(dir: &std::path::Path, store: Arc<MemoryStore>) -> LegacyKeyImporter {
        LegacyKeyImporter::new(dir.join("legacy.key"), store, dir.join("migrated"))
    }

    #[tokio::test]
    async fn record_key_wins_and_legacy_is_untouched() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("legacy.key"), "legacy").unwrap();
        let importer = importer(dir.path(), Arc::new(MemoryStore::new("legacy")));

        let resolved = resolve_key(
            &"E1".into(),
            Some(&record_with_key(Some("persisted"))),
            Some(&importer),
        )
        .await
        .unwrap();

        assert_eq!(resolved.origin, KeyOrigin::Record);
        assert_eq!(resolved.key.expose(), "persisted");
        assert!(dir.path().join("legacy.key").exists());
    }

    #[tokio::test]
    async fn record_without_key_generates_without_consulting_legacy() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("legacy.key"), "legacy").unwrap();
        let importer = importer(dir.path(), Arc::new(MemoryStore::new("legacy")));

        let resolved = resolve_key(&"E1".into(), Some(&record_with_key(None)), Some(&importer))
            .await
            .unwrap();

        assert_eq!(resolved.origin, KeyOrigin::Generated);
        assert!(dir.path().join("legacy.key").exists());
    }

    #[tokio::test]
    async fn no_record_imports_legacy_key() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryStore::new("legacy"));
        store.seed(json!({ "key": "from-store" })).await;

        let resolved = resolve_key(&"E1".into(), None, Some(&importer(dir.path(), store)))
            .await
            .unwrap();

        assert_eq!(
            resolved.origin,
            KeyOrigin::Legacy(MigrationSource::LegacyStore)
        );
        assert_eq!(resolved.key.expose(), "from-store");
    }

    #[tokio::test]
    async fn malformed_legacy_artifact_falls_through_to_generation() {
        let dir = tempdir().unwrap();
        let store = Arc::new(MemoryStore::new("legacy"));
        store.seed(json!({ "not_key": true })).await;

        let resolved = resolve_key(&"E1".into(), None, Some(&importer(dir.path(), store.clone())))
            .await
            .unwrap();

        assert_eq!(resolved.origin, KeyOrigin::Generated);
        assert!(store.snapshot().await.is_some());
    }

    #[tokio::test]
    async fn no_record_and_no_legacy_context_generates() {
        let resolved = resolve_key(&"E1".into(), None, None).await.unwrap();
        assert_eq!(resolved.origin, KeyOrigin::Generated);
        assert!(resolved.cipher().is_ok());
    }
}
