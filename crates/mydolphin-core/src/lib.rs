// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the MyDolphin Plus configuration store.
//!
//! Holds the error type, the persisted data model and the durable store
//! trait shared by every other crate in the workspace.

pub mod error;
pub mod traits;
pub mod types;

pub use error::MyDolphinError;
pub use traits::DocumentStore;
pub use types::{
    EntryCredentials, EntryDescriptor, EntryId, PersistedRecord, StoreDocument, DEFAULT_NAME,
    DETACHED_ENTRY_ID,
};
