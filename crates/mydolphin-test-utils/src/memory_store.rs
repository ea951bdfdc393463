// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory document store for deterministic testing.
//!
//! `MemoryStore` implements `DocumentStore` over a single JSON value and
//! counts every call, so tests can assert how often a component touched the
//! store. One-shot failures can be armed for load, save, and remove.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use mydolphin_core::{DocumentStore, MyDolphinError};

/// A document store that keeps its document in memory.
pub struct MemoryStore {
    key: String,
    document: Mutex<Option<Value>>,
    load_count: AtomicUsize,
    save_count: AtomicUsize,
    remove_count: AtomicUsize,
    fail_load: AtomicBool,
    fail_save: AtomicBool,
    fail_remove: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store identified by `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            document: Mutex::new(None),
            load_count: AtomicUsize::new(0),
            save_count: AtomicUsize::new(0),
            remove_count: AtomicUsize::new(0),
            fail_load: AtomicBool::new(false),
            fail_save: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
        }
    }

    /// Replace the stored document without counting a save.
    pub async fn seed(&self, document: Value) {
        *self.document.lock().await = Some(document);
    }

    /// Current document, if any.
    pub async fn snapshot(&self) -> Option<Value> {
        self.document.lock().await.clone()
    }

    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    pub fn remove_count(&self) -> usize {
        self.remove_count.load(Ordering::SeqCst)
    }

    /// Make the next `load` fail.
    pub fn fail_next_load(&self) {
        self.fail_load.store(true, Ordering::SeqCst);
    }

    /// Make the next `save` fail. The document is left unchanged.
    pub fn fail_next_save(&self) {
        self.fail_save.store(true, Ordering::SeqCst);
    }

    /// Make the next `remove` fail.
    pub fn fail_next_remove(&self) {
        self.fail_remove.store(true, Ordering::SeqCst);
    }

    fn injected(&self, flag: &AtomicBool, op: &str) -> Result<(), MyDolphinError> {
        if flag.swap(false, Ordering::SeqCst) {
            tracing::debug!(key = %self.key, op, "injected store failure");
            return Err(MyDolphinError::store(
                self.key.clone(),
                std::io::Error::other(format!("injected {op} failure")),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn key(&self) -> &str {
        &self.key
    }

    async fn load(&self) -> Result<Option<Value>, MyDolphinError> {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        self.injected(&self.fail_load, "load")?;
        Ok(self.document.lock().await.clone())
    }

    async fn save(&self, document: &Value) -> Result<(), MyDolphinError> {
        self.save_count.fetch_add(1, Ordering::SeqCst);
        self.injected(&self.fail_save, "save")?;
        *self.document.lock().await = Some(document.clone());
        Ok(())
    }

    async fn remove(&self) -> Result<(), MyDolphinError> {
        self.remove_count.fetch_add(1, Ordering::SeqCst);
        self.injected(&self.fail_remove, "remove")?;
        *self.document.lock().await = None;
        Ok(())
    }
}
