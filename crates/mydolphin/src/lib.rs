// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypted per-entry configuration store for the MyDolphin Plus
//! integration.
//!
//! ```no_run
//! use mydolphin::{EntryCredentials, EntryDescriptor, StoreContext};
//!
//! # async fn run() -> Result<(), mydolphin::MyDolphinError> {
//! let config = mydolphin_config::load_and_validate()
//!     .map_err(|errors| mydolphin_config::into_core_error(&errors))?;
//! mydolphin::telemetry::init_tracing(&config.logging.level)?;
//!
//! let context = StoreContext::from_config(&config);
//! let mut manager = context.manager(
//!     EntryDescriptor::new("E1", "Pool robot"),
//!     EntryCredentials::new("user@example.com", Some("secret".into())),
//! );
//! manager.initialize().await?;
//! let token = manager.password_hashed()?;
//! # let _ = token;
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod manager;
pub mod shared;
pub mod telemetry;

pub use context::StoreContext;
pub use manager::ConfigManager;
pub use shared::SharedStore;

pub use mydolphin_core::{
    EntryCredentials, EntryDescriptor, EntryId, MyDolphinError, PersistedRecord,
};
pub use mydolphin_vault::KeyOrigin;
