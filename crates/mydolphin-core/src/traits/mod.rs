// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the configuration manager and its collaborators.

pub mod store;

pub use store::DocumentStore;
