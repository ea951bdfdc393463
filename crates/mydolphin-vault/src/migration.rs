// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot import of the encryption key from pre-multi-tenant artifacts.
//!
//! Older releases kept the key either in a bare key file in the host config
//! directory or in a single-tenant store document shaped `{"key": "..."}`.
//! The importer adopts the first one it finds, deletes it, and records a
//! completion marker so later runs return immediately.
//!
//! A malformed artifact aborts the import without touching the artifact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mydolphin_core::{DocumentStore, MyDolphinError};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::key::EncryptionKey;

/// Where an imported key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationSource {
    KeyFile,
    LegacyStore,
}

/// Result of one importer run.
#[derive(Debug)]
pub enum MigrationOutcome {
    /// A legacy key was adopted and its artifact deleted.
    Imported {
        key: EncryptionKey,
        source: MigrationSource,
    },
    /// No legacy artifact exists.
    NothingFound,
    /// The completion marker says the migration already ran.
    AlreadyCompleted,
}

#[derive(Debug, Serialize, Deserialize)]
struct MigrationMarker {
    completed: bool,
    source: Option<MigrationSource>,
}

/// Imports a key from the legacy key file or the legacy single-tenant store.
///
/// Runs are serialized, so concurrent callers sharing one importer see at
/// most one `Imported` outcome.
pub struct LegacyKeyImporter {
    key_file: PathBuf,
    legacy_store: Arc<dyn DocumentStore>,
    marker_path: PathBuf,
    run_lock: Mutex<()>,
}

impl std::fmt::Debug for LegacyKeyImporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyKeyImporter")
            .field("key_file", &self.key_file)
            .field("legacy_store", &self.legacy_store.key())
            .field("marker_path", &self.marker_path)
            .finish()
    }
}

impl LegacyKeyImporter {
    pub fn new(
        key_file: impl Into<PathBuf>,
        legacy_store: Arc<dyn DocumentStore>,
        marker_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            key_file: key_file.into(),
            legacy_store,
            marker_path: marker_path.into(),
            run_lock: Mutex::new(()),
        }
    }

    /// Where the key file is looked up.
    pub fn key_file(&self) -> &Path {
        &self.key_file
    }

    /// Where completion is recorded.
    pub fn marker_path(&self) -> &Path {
        &self.marker_path
    }

    /// Whether a previous run recorded completion.
    pub async fn is_completed(&self) -> bool {
        matches!(tokio::fs::try_exists(&self.marker_path).await, Ok(true))
    }

    /// Run the migration.
    ///
    /// Returns [`MyDolphinError::Migration`] when an artifact exists but
    /// cannot be imported; the artifact is then left in place.
    pub async fn run(&self) -> Result<MigrationOutcome, MyDolphinError> {
        let _running = self.run_lock.lock().await;
        if self.is_completed().await {
            debug!(marker = %self.marker_path.display(), "legacy key migration already completed");
            return Ok(MigrationOutcome::AlreadyCompleted);
        }

        let imported = match self.import_key_file().await? {
            Some(key) => Some((key, MigrationSource::KeyFile)),
            None => self
                .import_legacy_store()
                .await?
                .map(|key| (key, MigrationSource::LegacyStore)),
        };

        let source = imported.as_ref().map(|(_, source)| *source);
        self.record_completion(source).await;

        match imported {
            Some((key, source)) => {
                info!(?source, "imported encryption key from legacy artifact");
                Ok(MigrationOutcome::Imported { key, source })
            }
            None => {
                debug!("no legacy key artifact found");
                Ok(MigrationOutcome::NothingFound)
            }
        }
    }

    async fn import_key_file(&self) -> Result<Option<EncryptionKey>, MyDolphinError> {
        let bytes = match tokio::fs::read(&self.key_file).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(migration_error(
                    format!("legacy key file {} is unreadable", self.key_file.display()),
                    e,
                ));
            }
        };

        let material = String::from_utf8(bytes).map_err(|e| {
            migration_error(
                format!("legacy key file {} is not UTF-8", self.key_file.display()),
                e,
            )
        })?;
        let key = EncryptionKey::from_material(material).map_err(|e| {
            migration_error(
                format!("legacy key file {} holds no key", self.key_file.display()),
                e,
            )
        })?;

        tokio::fs::remove_file(&self.key_file).await.map_err(|e| {
            migration_error(
                format!(
                    "legacy key file {} could not be deleted after import",
                    self.key_file.display()
                ),
                e,
            )
        })?;

        Ok(Some(key))
    }

    async fn import_legacy_store(&self) -> Result<Option<EncryptionKey>, MyDolphinError> {
        let store_key = self.legacy_store.key().to_string();
        let Some(document) = self
            .legacy_store
            .load()
            .await
            .map_err(|e| migration_error(format!("legacy store `{store_key}` is unreadable"), e))?
        else {
            return Ok(None);
        };

        let material = document
            .get("key")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                MyDolphinError::migration(format!(
                    "legacy store `{store_key}` has no string `key` field"
                ))
            })?;
        let key = EncryptionKey::from_material(material).map_err(|e| {
            migration_error(format!("legacy store `{store_key}` holds no key"), e)
        })?;

        self.legacy_store.remove().await.map_err(|e| {
            migration_error(
                format!("legacy store `{store_key}` could not be removed after import"),
                e,
            )
        })?;

        Ok(Some(key))
    }

    async fn record_completion(&self, source: Option<MigrationSource>) {
        let marker = MigrationMarker {
            completed: true,
            source,
        };
        let written = async {
            if let Some(parent) = self.marker_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let bytes = serde_json::to_vec(&marker).map_err(std::io::Error::other)?;
            tokio::fs::write(&self.marker_path, bytes).await
        }
        .await;

        // Artifacts are deleted by now; without a marker the next run simply
        // finds nothing.
        if let Err(e) = written {
            warn!(
                marker = %self.marker_path.display(),
                error = %e,
                "failed to record legacy key migration marker"
            );
        }
    }
}

fn migration_error(
    message: String,
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> MyDolphinError {
    MyDolphinError::Migration {
        message,
        source: Some(source.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{resolve_key, KeyOrigin};
    use mydolphin_test_utils::MemoryStore;
    use serde_json::json;
    use tempfile::tempdir;

    struct Fixture {
        _dir: tempfile::TempDir,
        legacy_store: Arc<MemoryStore>,
        importer: LegacyKeyImporter,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let legacy_store = Arc::new(MemoryStore::new(".mydolphin_plus"));
        let importer = LegacyKeyImporter::new(
            dir.path().join(".mydolphin_plus.key"),
            legacy_store.clone(),
            dir.path().join(".storage/.mydolphin_plus.migrated"),
        );
        Fixture {
            _dir: dir,
            legacy_store,
            importer,
        }
    }

    #[tokio::test]
    async fn imports_and_deletes_key_file() {
        let f = fixture();
        std::fs::write(f.importer.key_file(), "abc123").unwrap();

        match f.importer.run().await.unwrap() {
            MigrationOutcome::Imported { key, source } => {
                assert_eq!(key.expose(), "abc123");
                assert_eq!(source, MigrationSource::KeyFile);
            }
            other => panic!("expected import, got {other:?}"),
        }
        assert!(!f.importer.key_file().exists());
        assert!(f.importer.is_completed().await);
    }

    #[tokio::test]
    async fn key_file_wins_over_legacy_store() {
        let f = fixture();
        std::fs::write(f.importer.key_file(), "from-file").unwrap();
        f.legacy_store.seed(json!({ "key": "from-store" })).await;

        let MigrationOutcome::Imported { key, .. } = f.importer.run().await.unwrap() else {
            panic!("expected import");
        };
        assert_eq!(key.expose(), "from-file");
        assert!(f.legacy_store.snapshot().await.is_some());
    }

    #[tokio::test]
    async fn imports_and_removes_legacy_store() {
        let f = fixture();
        f.legacy_store.seed(json!({ "key": "store-key" })).await;

        let MigrationOutcome::Imported { key, source } = f.importer.run().await.unwrap() else {
            panic!("expected import");
        };
        assert_eq!(key.expose(), "store-key");
        assert_eq!(source, MigrationSource::LegacyStore);
        assert!(f.legacy_store.snapshot().await.is_none());
        assert_eq!(f.legacy_store.remove_count(), 1);
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let f = fixture();
        std::fs::write(f.importer.key_file(), "abc123").unwrap();

        assert!(matches!(
            f.importer.run().await.unwrap(),
            MigrationOutcome::Imported { .. }
        ));
        assert!(matches!(
            f.importer.run().await.unwrap(),
            MigrationOutcome::AlreadyCompleted
        ));
    }

    #[tokio::test]
    async fn nothing_found_is_not_an_error_and_is_recorded() {
        let f = fixture();
        assert!(matches!(
            f.importer.run().await.unwrap(),
            MigrationOutcome::NothingFound
        ));
        assert!(f.importer.is_completed().await);
        assert!(matches!(
            f.importer.run().await.unwrap(),
            MigrationOutcome::AlreadyCompleted
        ));
    }

    #[tokio::test]
    async fn missing_marker_still_finds_nothing_after_import() {
        let f = fixture();
        std::fs::write(f.importer.key_file(), "abc123").unwrap();
        f.importer.run().await.unwrap();
        std::fs::remove_file(f.importer.marker_path()).unwrap();

        assert!(matches!(
            f.importer.run().await.unwrap(),
            MigrationOutcome::NothingFound
        ));
    }

    #[tokio::test]
    async fn store_without_key_field_aborts_and_keeps_artifact() {
        let f = fixture();
        f.legacy_store.seed(json!({ "other": 1 })).await;

        let err = f.importer.run().await.unwrap_err();
        assert!(err.is_migration());
        assert!(f.legacy_store.snapshot().await.is_some());
        assert!(!f.importer.is_completed().await);
    }

    #[tokio::test]
    async fn empty_key_file_aborts_and_keeps_file() {
        let f = fixture();
        std::fs::write(f.importer.key_file(), "").unwrap();

        assert!(f.importer.run().await.unwrap_err().is_migration());
        assert!(f.importer.key_file().exists());
    }

    #[tokio::test]
    async fn non_utf8_key_file_aborts_and_keeps_file() {
        let f = fixture();
        std::fs::write(f.importer.key_file(), [0xff, 0xfe, 0x00]).unwrap();

        assert!(f.importer.run().await.unwrap_err().is_migration());
        assert!(f.importer.key_file().exists());
    }

    #[tokio::test]
    async fn unreadable_legacy_store_is_a_migration_error() {
        let f = fixture();
        f.legacy_store.fail_next_load();

        assert!(f.importer.run().await.unwrap_err().is_migration());
    }

    #[tokio::test]
    async fn legacy_store_that_cannot_be_removed_aborts_and_falls_through() {
        let f = fixture();
        f.legacy_store.seed(json!({ "key": "store-key" })).await;

        f.legacy_store.fail_next_remove();
        assert!(f.importer.run().await.unwrap_err().is_migration());
        assert!(f.legacy_store.snapshot().await.is_some());
        assert!(!f.importer.marker_path().exists());

        f.legacy_store.fail_next_remove();
        let resolved = resolve_key(&"E1".into(), None, Some(&f.importer))
            .await
            .unwrap();
        assert_eq!(resolved.origin, KeyOrigin::Generated);
        assert!(!f.importer.marker_path().exists());
        assert_eq!(f.legacy_store.remove_count(), 2);
    }

    #[tokio::test]
    async fn key_file_that_is_a_directory_aborts_and_falls_through() {
        let f = fixture();
        std::fs::create_dir(f.importer.key_file()).unwrap();

        assert!(f.importer.run().await.unwrap_err().is_migration());
        assert!(f.importer.key_file().is_dir());
        assert!(!f.importer.marker_path().exists());

        let resolved = resolve_key(&"E1".into(), None, Some(&f.importer))
            .await
            .unwrap();
        assert_eq!(resolved.origin, KeyOrigin::Generated);
        assert!(!f.importer.marker_path().exists());
    }

    // procfs files are readable but cannot be unlinked, even by root.
    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn key_file_that_cannot_be_deleted_aborts_and_falls_through() {
        let dir = tempdir().unwrap();
        let legacy_store = Arc::new(MemoryStore::new(".mydolphin_plus"));
        let importer = LegacyKeyImporter::new(
            "/proc/self/comm",
            legacy_store,
            dir.path().join(".storage/.mydolphin_plus.migrated"),
        );

        let err = importer.run().await.unwrap_err();
        assert!(err.is_migration());
        assert!(err.to_string().contains("could not be deleted"));
        assert!(!importer.marker_path().exists());

        let resolved = resolve_key(&"E1".into(), None, Some(&importer))
            .await
            .unwrap();
        assert_eq!(resolved.origin, KeyOrigin::Generated);
        assert!(!importer.marker_path().exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_runs_import_exactly_once() {
        for _ in 0..20 {
            let f = fixture();
            f.legacy_store.seed(json!({ "key": "store-key" })).await;
            let importer = Arc::new(f.importer);

            let runs: Vec<_> = (0..4)
                .map(|_| {
                    let importer = importer.clone();
                    tokio::spawn(async move { importer.run().await })
                })
                .collect();

            let mut imported = 0;
            for run in runs {
                match run.await.unwrap().unwrap() {
                    MigrationOutcome::Imported { .. } => imported += 1,
                    MigrationOutcome::AlreadyCompleted => {}
                    MigrationOutcome::NothingFound => panic!("import raced with removal"),
                }
            }
            assert_eq!(imported, 1);
            assert_eq!(f.legacy_store.remove_count(), 1);
        }
    }
}
