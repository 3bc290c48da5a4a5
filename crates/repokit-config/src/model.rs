// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Repokit plugin host.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use repokit_core::Settings;
use serde::{Deserialize, Serialize};

/// Top-level Repokit configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RepokitConfig {
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,

    /// Plugin discovery and activation settings.
    #[serde(default)]
    pub plugins: PluginsConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Plugin activation and discovery configuration.
///
/// The registry takes this by value and never mutates it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginsConfig {
    /// Allow-list. When non-empty only these ids may be enabled.
    #[serde(default)]
    pub enable: Vec<String>,

    /// Disable list. Always wins over `enable`.
    #[serde(default)]
    pub disable: Vec<String>,

    /// Uniform budget for load and unload hooks, in milliseconds.
    #[serde(default = "default_hook_timeout_ms")]
    pub hook_timeout_ms: u64,

    /// Built-in plugin directory, scanned in addition to compiled-in plugins.
    #[serde(default)]
    pub builtin_dir: Option<PathBuf>,

    /// User-global plugin directory. Defaults to `<config dir>/repokit/plugins`.
    #[serde(default)]
    pub user_dir: Option<PathBuf>,

    /// Project-local plugin directory, relative to the working directory.
    #[serde(default = "default_project_dir")]
    pub project_dir: PathBuf,

    /// Per-plugin settings, keyed by plugin id then setting name.
    #[serde(default)]
    pub settings: BTreeMap<String, Settings>,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            enable: Vec::new(),
            disable: Vec::new(),
            hook_timeout_ms: default_hook_timeout_ms(),
            builtin_dir: None,
            user_dir: None,
            project_dir: default_project_dir(),
            settings: BTreeMap::new(),
        }
    }
}

impl PluginsConfig {
    pub fn hook_timeout(&self) -> Duration {
        Duration::from_millis(self.hook_timeout_ms)
    }

    /// Effective user-global plugin directory, with `~/` expanded.
    pub fn user_plugin_dir(&self) -> Option<PathBuf> {
        match &self.user_dir {
            Some(dir) => Some(expand_home(dir)),
            None => dirs::config_dir().map(|d| d.join("repokit/plugins")),
        }
    }

    /// Effective built-in plugin directory, with `~/` expanded.
    pub fn builtin_plugin_dir(&self) -> Option<PathBuf> {
        self.builtin_dir.as_deref().map(expand_home)
    }
}

fn default_hook_timeout_ms() -> u64 {
    5000
}

fn default_project_dir() -> PathBuf {
    PathBuf::from(".repokit/plugins")
}

fn expand_home(path: &std::path::Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
