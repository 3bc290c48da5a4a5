// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `/etc/repokit/repokit.toml`, then
//! `$XDG_CONFIG_HOME/repokit/repokit.toml`, then `./repokit.toml`, with
//! `REPOKIT_*` environment variables applied last.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::RepokitConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/repokit/repokit.toml";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "repokit.toml";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "REPOKIT_";

/// User configuration file under the XDG config directory, if one exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("repokit").join(LOCAL_CONFIG_FILE))
}

/// Every file location consulted by [`load_config`], lowest precedence first.
pub fn config_file_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(SYSTEM_CONFIG_PATH)];
    paths.extend(user_config_path());
    paths.push(PathBuf::from(LOCAL_CONFIG_FILE));
    paths
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/repokit/repokit.toml`
/// 3. `~/.config/repokit/repokit.toml`
/// 4. `./repokit.toml`
/// 5. `REPOKIT_*` environment variables
pub fn load_config() -> Result<RepokitConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string over the compiled defaults.
///
/// No files and no environment variables are consulted.
pub fn load_config_from_str(toml_content: &str) -> Result<RepokitConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RepokitConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
///
/// Unlike the standard hierarchy, the file must exist.
pub fn load_config_from_path(path: &Path) -> Result<RepokitConfig, figment::Error> {
    if !path.is_file() {
        return Err(figment::Error::from(format!(
            "configuration file `{}` not found",
            path.display()
        )));
    }
    Figment::new()
        .merge(Serialized::defaults(RepokitConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment behind [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    config_file_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(RepokitConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Only the first underscore after the section name becomes a dot, so
/// `REPOKIT_PLUGINS_HOOK_TIMEOUT_MS` maps to `plugins.hook_timeout_ms`.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).map(|key| map_env_key(key.as_str()).into())
}

/// Keys arrive with their original case; sections are matched lowercased.
fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    if let Some(rest) = key.strip_prefix("log_") {
        format!("log.{rest}")
    } else if let Some(rest) = key.strip_prefix("plugins_") {
        format!("plugins.{rest}")
    } else {
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_paths_end_with_local_file() {
        let paths = config_file_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from(SYSTEM_CONFIG_PATH)));
        assert_eq!(paths.last(), Some(&PathBuf::from(LOCAL_CONFIG_FILE)));
    }

    #[test]
    fn string_overrides_defaults() {
        let config = load_config_from_str("[plugins]\nhook_timeout_ms = 250\n").unwrap();
        assert_eq!(config.plugins.hook_timeout_ms, 250);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn env_keys_map_to_sections_regardless_of_case() {
        assert_eq!(map_env_key("PLUGINS_HOOK_TIMEOUT_MS"), "plugins.hook_timeout_ms");
        assert_eq!(map_env_key("LOG_LEVEL"), "log.level");
        assert_eq!(map_env_key("plugins_project_dir"), "plugins.project_dir");
        assert_eq!(map_env_key("UNRELATED"), "unrelated");
    }

    #[test]
    fn explicit_path_must_exist() {
        let err = load_config_from_path(Path::new("/nonexistent/repokit-typo.toml"))
            .expect_err("missing explicit file");
        assert!(err.to_string().contains("not found"), "got: {err}");
    }
}
