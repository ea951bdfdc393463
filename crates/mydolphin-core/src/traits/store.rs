// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable document store contract.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::MyDolphinError;

/// A whole-document key-value store.
///
/// One implementation instance serves exactly one document, identified by
/// [`DocumentStore::key`]. Documents are arbitrary nested JSON values.
/// Implementations are expected to replace the document atomically on
/// [`DocumentStore::save`].
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// The opaque identifier of the document this store serves.
    fn key(&self) -> &str;

    /// Loads the whole document, or `None` if it has never been saved.
    async fn load(&self) -> Result<Option<Value>, MyDolphinError>;

    /// Replaces the whole document.
    async fn save(&self, document: &Value) -> Result<(), MyDolphinError>;

    /// Deletes the document. Removing a missing document is not an error.
    async fn remove(&self) -> Result<(), MyDolphinError>;
}
