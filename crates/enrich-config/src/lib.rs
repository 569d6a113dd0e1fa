// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the enrichment service.
//!
//! TOML files layered under `ENRICH_*` environment overrides, strict
//! unknown-key rejection, and miette diagnostics with typo suggestions.
//!
//! ```no_run
//! let config = enrich_config::load_and_validate().expect("config errors");
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{EnrichConfig, secs};

/// Loads from the standard hierarchy and validates.
pub fn load_and_validate() -> Result<EnrichConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => validation::validate_config(&config).map(|()| config),
        Err(err) => {
            let sources = loader::read_config_sources(&loader::config_paths());
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Loads an explicit file (plus environment overrides) and validates.
pub fn load_and_validate_path(path: &std::path::Path) -> Result<EnrichConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => validation::validate_config(&config).map(|()| config),
        Err(err) => {
            let sources = loader::read_config_sources(&[path.to_path_buf()]);
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Loads an inline TOML document and validates.
pub fn load_and_validate_str(toml_content: &str) -> Result<EnrichConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => validation::validate_config(&config).map(|()| config),
        Err(err) => {
            let sources = [("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// A configured secret, or the named well-known environment variable.
///
/// Empty values count as unset.
pub fn resolve_secret(configured: Option<&str>, env_var: &str) -> Option<String> {
    configured
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .or_else(|| std::env::var(env_var).ok().filter(|s| !s.trim().is_empty()))
}
