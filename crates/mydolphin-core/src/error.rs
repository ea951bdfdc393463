// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the MyDolphin Plus configuration store.

use thiserror::Error;

/// The error type shared by every MyDolphin crate.
///
/// `Store`, `Crypto` and `Migration` are kept apart on purpose: a store
/// failure is transient I/O, a crypto failure means the key or the data is
/// wrong, and a migration failure only costs the legacy key.
#[derive(Debug, Error)]
pub enum MyDolphinError {
    /// Settings could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(String),

    /// The durable store failed to load, save, or remove a document, or the
    /// document it returned has the wrong shape.
    #[error("store error ({key}): {source}")]
    Store {
        key: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Decryption failed (wrong key, tampering, malformed token) or a key
    /// could not be turned into a cipher.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// A legacy key artifact exists but could not be imported.
    #[error("legacy key migration failed: {message}")]
    Migration {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An accessor that needs the cipher context was called before
    /// `initialize()`.
    #[error("config manager for entry `{entry_id}` is not initialized")]
    NotInitialized { entry_id: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MyDolphinError {
    /// Build a [`MyDolphinError::Store`] for the document identified by `key`.
    pub fn store(
        key: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Store {
            key: key.into(),
            source: source.into(),
        }
    }

    /// Build a [`MyDolphinError::Migration`] without an underlying cause.
    pub fn migration(message: impl Into<String>) -> Self {
        Self::Migration {
            message: message.into(),
            source: None,
        }
    }

    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store { .. })
    }

    pub fn is_crypto(&self) -> bool {
        matches!(self, Self::Crypto(_))
    }

    pub fn is_migration(&self) -> bool {
        matches!(self, Self::Migration { .. })
    }
}
