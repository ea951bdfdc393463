// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracing setup for binaries and tests that embed the store.

use mydolphin_core::MyDolphinError;
use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` overrides `log_level`. Fails if a global subscriber is
/// already set.
pub fn init_tracing(log_level: &str) -> Result<(), MyDolphinError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mydolphin={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init()
        .map_err(|e| MyDolphinError::Internal(format!("failed to install tracing subscriber: {e}")))
}
