// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential encryption for the MyDolphin Plus configuration store.
//!
//! Every entry owns one key. The key is persisted next to the entry's record
//! and turned into an AES-256-GCM cipher through HKDF-SHA256. Only the
//! password field is ever encrypted with it.
//!
//! Key resolution prefers the persisted key, then a key imported once from
//! a legacy artifact, then a fresh key.

pub mod cipher;
pub mod crypto;
pub mod key;
pub mod migration;
pub mod provider;

pub use cipher::{CipherContext, TOKEN_VERSION};
pub use key::EncryptionKey;
pub use migration::{LegacyKeyImporter, MigrationOutcome, MigrationSource};
pub use provider::{resolve_key, KeyOrigin, ResolvedKey};
