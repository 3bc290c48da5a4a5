// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Covers constraints serde cannot express: plugin id syntax in the
//! activation lists and settings tables, a positive hook budget and a known
//! log level.

use repokit_core::is_valid_plugin_id;
use tracing::warn;

use crate::diagnostic::ConfigError;
use crate::model::RepokitConfig;

/// Log levels accepted by `log.level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns every problem found rather than stopping at the first.
pub fn validate_config(config: &RepokitConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.log.level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` is not one of {}",
                config.log.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    let plugins = &config.plugins;
    if plugins.hook_timeout_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "plugins.hook_timeout_ms must be greater than 0".to_string(),
        });
    }

    for (list, ids) in [("enable", &plugins.enable), ("disable", &plugins.disable)] {
        for id in ids.iter().filter(|id| !is_valid_plugin_id(id)) {
            errors.push(ConfigError::Validation {
                message: format!("plugins.{list} entry `{id}` is not a valid plugin id"),
            });
        }
    }

    for id in plugins.settings.keys().filter(|id| !is_valid_plugin_id(id)) {
        errors.push(ConfigError::Validation {
            message: format!("plugins.settings table `{id}` is not a valid plugin id"),
        });
    }

    for id in plugins.enable.iter().filter(|id| plugins.disable.contains(id)) {
        warn!(plugin = %id, "plugin is on both enable and disable lists; disable wins");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(errors: &[ConfigError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&RepokitConfig::default()).is_ok());
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let mut config = RepokitConfig::default();
        config.plugins.hook_timeout_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("hook_timeout_ms"))
        ));
    }

    #[test]
    fn collects_every_problem() {
        let mut config = RepokitConfig::default();
        config.log.level = "loud".to_string();
        config.plugins.enable = vec!["GitLab".to_string()];
        config.plugins.disable = vec!["-bad".to_string()];
        config
            .plugins
            .settings
            .insert("Not Valid".to_string(), Default::default());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        let all = messages(&errors).join("\n");
        assert!(all.contains("log.level"));
        assert!(all.contains("plugins.enable entry `GitLab`"));
        assert!(all.contains("plugins.disable entry `-bad`"));
        assert!(all.contains("plugins.settings table `Not Valid`"));
    }

    #[test]
    fn id_on_both_lists_is_legal() {
        let mut config = RepokitConfig::default();
        config.plugins.enable = vec!["gitlab".to_string()];
        config.plugins.disable = vec!["gitlab".to_string()];
        assert!(validate_config(&config).is_ok());
    }
}
