// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The shared multi-tenant document and its single writer lock.
//!
//! Every manager bound to the same document holds a clone of one
//! [`SharedStore`]. The retained copy of the document and the durable store
//! sit behind one async mutex, so each load-mutate-save is serialized across
//! entries and tasks.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use mydolphin_core::{DocumentStore, EntryId, MyDolphinError, PersistedRecord, StoreDocument};

/// Handle to a shared store document. Cheap to clone.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn DocumentStore>,
    retained: Mutex<Option<StoreDocument>>,
}

impl std::fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStore")
            .field("key", &self.key())
            .finish()
    }
}

impl SharedStore {
    /// Wrap a durable store. Nothing is loaded until first use.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                retained: Mutex::new(None),
            }),
        }
    }

    /// Identifier of the underlying document.
    pub fn key(&self) -> &str {
        self.inner.store.key()
    }

    /// Fetch the whole document, retain it, and return the record of
    /// `entry_id`. A missing document or record is `Ok(None)`.
    pub async fn load_record(
        &self,
        entry_id: &EntryId,
    ) -> Result<Option<PersistedRecord>, MyDolphinError> {
        let mut retained = self.inner.retained.lock().await;
        let document = self.fetch().await?;
        let record = document.record(self.key(), entry_id)?;
        debug!(
            key = %self.key(),
            entry_id = %entry_id,
            entries = document.len(),
            found = record.is_some(),
            "loaded store document"
        );
        *retained = Some(document);
        Ok(record)
    }

    /// Merge `record` into the retained document and write the whole
    /// document back.
    ///
    /// The retained copy is not re-fetched. It is only loaded here when no
    /// manager has loaded it yet. A failed write is returned as is; the
    /// retained copy keeps the merged record so the next save carries it.
    pub async fn save_record(
        &self,
        entry_id: &EntryId,
        record: &PersistedRecord,
    ) -> Result<(), MyDolphinError> {
        let mut retained = self.inner.retained.lock().await;
        let document = match retained.take() {
            Some(document) => document,
            None => self.fetch().await?,
        };
        let document = retained.insert(document);

        document.merge_record(entry_id, record)?;
        self.inner.store.save(&document.to_value()).await?;
        debug!(
            key = %self.key(),
            entry_id = %entry_id,
            entries = document.len(),
            "saved store document"
        );
        Ok(())
    }

    /// A copy of the retained document, loading it first if needed.
    pub async fn snapshot(&self) -> Result<StoreDocument, MyDolphinError> {
        let mut retained = self.inner.retained.lock().await;
        if let Some(document) = retained.as_ref() {
            return Ok(document.clone());
        }
        let document = self.fetch().await?;
        *retained = Some(document.clone());
        Ok(document)
    }

    async fn fetch(&self) -> Result<StoreDocument, MyDolphinError> {
        let value = self.inner.store.load().await?;
        StoreDocument::from_value(self.key(), value)
    }
}
