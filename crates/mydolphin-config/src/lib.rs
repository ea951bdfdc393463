// SPDX-FileCopyrightText: 2026 MyDolphin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings for the MyDolphin Plus configuration store.
//!
//! TOML files merged through Figment with `MYDOLPHIN_` environment
//! overrides, strict unknown-key rejection, and miette diagnostics with
//! typo suggestions.
//!
//! ```no_run
//! use mydolphin_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("shared document: {}", config.storage.document_key);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{into_core_error, render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::MyDolphinConfig;

/// Load settings from the standard hierarchy and validate them.
pub fn load_and_validate() -> Result<MyDolphinConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(),
        )),
    }
}

/// Load settings from an inline TOML string and validate them.
pub fn load_and_validate_str(toml_content: &str) -> Result<MyDolphinConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Read every settings file that exists, for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![
        loader::local_config_path().to_path_buf(),
        loader::system_config_path().to_path_buf(),
    ];
    candidates.extend(loader::user_config_path());

    candidates
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            Some((path.display().to_string(), content))
        })
        .collect()
}
