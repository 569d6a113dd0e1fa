// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading.
//!
//! Merge order, later wins: compiled defaults, `/etc/enrich/enrich.toml`,
//! `$XDG_CONFIG_HOME/enrich/enrich.toml`, `./enrich.toml`, then `ENRICH_*`
//! environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::EnrichConfig;

const SYSTEM_CONFIG: &str = "/etc/enrich/enrich.toml";
const LOCAL_CONFIG: &str = "enrich.toml";

/// Top-level sections, used to map `ENRICH_SECTION_KEY` onto `section.key`.
const SECTIONS: &[&str] = &[
    "server",
    "search",
    "anthropic",
    "enrichment",
    "billing",
    "storage",
];

/// Config files consulted by [`load_config`], lowest precedence first.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(SYSTEM_CONFIG)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("enrich").join(LOCAL_CONFIG));
    }
    paths.push(PathBuf::from(LOCAL_CONFIG));
    paths
}

/// Builds the full figment without extracting it.
pub fn build_figment() -> Figment {
    config_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(EnrichConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Loads from the standard file hierarchy plus environment overrides.
pub fn load_config() -> Result<EnrichConfig, figment::Error> {
    build_figment().extract()
}

/// Loads defaults overlaid with an inline TOML document. Ignores the environment.
pub fn load_config_from_str(toml_content: &str) -> Result<EnrichConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EnrichConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Loads defaults, a single explicit file, then environment overrides.
pub fn load_config_from_path(path: &Path) -> Result<EnrichConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EnrichConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// `ENRICH_SEARCH_API_KEY` becomes `search.api_key`.
///
/// figment passes keys in their original case, so they are lowercased first.
///
/// Only the leading section name is rewritten, so keys that contain another
/// section's name (`enrichment.search_timeout_secs`) are left intact.
fn env_provider() -> Env {
    Env::prefixed("ENRICH_").map(|key| {
        let key = key.as_str().to_ascii_lowercase();
        SECTIONS
            .iter()
            .find_map(|section| {
                key.strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or(key)
            .into()
    })
}

/// Reads the contents of every config file that exists, for diagnostics.
pub(crate) fn read_config_sources(paths: &[PathBuf]) -> Vec<(String, String)> {
    paths
        .iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(path).ok()?;
            // figment reports file sources with absolute paths.
            let shown = std::fs::canonicalize(path).unwrap_or_else(|_| path.clone());
            Some((shown.display().to_string(), content))
        })
        .collect()
}
