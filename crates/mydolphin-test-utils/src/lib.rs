// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for MyDolphin Plus integration tests.
//!
//! # Components
//!
//! - [`MemoryStore`] - In-memory document store with failure injection
//! - [`TestHarness`] - Temp config directory with settings pointing into it

pub mod harness;
pub mod memory_store;

pub use harness::TestHarness;
pub use memory_store::MemoryStore;
