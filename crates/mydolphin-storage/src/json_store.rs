// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`DocumentStore`] backed by one JSON file per document.
//!
//! On disk every document is wrapped in a versioned envelope:
//!
//! ```json
//! { "version": 1, "minor_version": 1, "key": "mydolphin_plus.config", "data": { } }
//! ```
//!
//! Saves write a sibling temporary file, fsync it, and rename it over the
//! target, so readers see either the old or the new document, never a torn
//! one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mydolphin_core::{DocumentStore, MyDolphinError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Highest envelope major version this build understands.
pub const STORAGE_VERSION: u32 = 1;

/// Minor version written with every save.
pub const STORAGE_MINOR_VERSION: u32 = 1;

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    #[serde(default)]
    minor_version: u32,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    data: Value,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    minor_version: u32,
    key: &'a str,
    data: &'a Value,
}

/// A JSON file holding a single store document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    key: String,
    path: PathBuf,
}

impl JsonFileStore {
    /// A store for document `key` living at `<directory>/<key>`.
    pub fn new(directory: impl AsRef<Path>, key: impl Into<String>) -> Self {
        let key = key.into();
        let path = directory.as_ref().join(&key);
        Self { key, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn err(&self, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> MyDolphinError {
        MyDolphinError::store(&self.key, source)
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    fn key(&self) -> &str {
        &self.key
    }

    async fn load(&self) -> Result<Option<Value>, MyDolphinError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(key = %self.key, "store document not found");
                return Ok(None);
            }
            Err(e) => return Err(self.err(e)),
        };

        let envelope: Envelope = serde_json::from_slice(&bytes)
            .map_err(|e| self.err(format!("{} is not a valid store file: {e}", self.path.display())))?;

        if envelope.version > STORAGE_VERSION {
            return Err(self.err(format!(
                "store file version {}.{} is newer than supported version {STORAGE_VERSION}",
                envelope.version, envelope.minor_version
            )));
        }
        if let Some(stored_key) = envelope.key.as_deref()
            && stored_key != self.key
        {
            debug!(key = %self.key, stored_key, "store file carries a different key");
        }

        debug!(key = %self.key, version = envelope.version, "store document loaded");
        Ok(Some(envelope.data))
    }

    async fn save(&self, document: &Value) -> Result<(), MyDolphinError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.err(e))?;
        }

        let bytes = serde_json::to_vec_pretty(&EnvelopeRef {
            version: STORAGE_VERSION,
            minor_version: STORAGE_MINOR_VERSION,
            key: &self.key,
            data: document,
        })
        .map_err(|e| self.err(e))?;

        let temp = self.temp_path();
        let written = async {
            let mut file = tokio::fs::File::create(&temp).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
            tokio::fs::rename(&temp, &self.path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(self.err(e));
        }

        debug!(key = %self.key, bytes = bytes.len(), "store document saved");
        Ok(())
    }

    async fn remove(&self) -> Result<(), MyDolphinError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(key = %self.key, "store document removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.err(e)),
        }
    }
}
