// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable store implementations for the MyDolphin Plus configuration store.

pub mod json_store;

pub use json_store::{JsonFileStore, STORAGE_MINOR_VERSION, STORAGE_VERSION};
