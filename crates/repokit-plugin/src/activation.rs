// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Activation policy derived from the `[plugins]` configuration.
//!
//! The disable list always wins. A non-empty enable list is an allow-list:
//! being on it is necessary but not sufficient. Ids constrained by neither
//! list default to enabled.

use std::collections::{BTreeMap, BTreeSet};

use repokit_config::PluginsConfig;
use repokit_core::Settings;

/// Outcome of consulting the configuration for one id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Allowed,
    Denied { reason: String },
}

impl Activation {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Activation::Allowed)
    }
}

/// Immutable view over the enable/disable lists and per-plugin settings.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    enable: BTreeSet<String>,
    disable: BTreeSet<String>,
    settings: BTreeMap<String, Settings>,
}

impl ConfigResolver {
    pub fn new(config: &PluginsConfig) -> Self {
        Self {
            enable: config.enable.iter().cloned().collect(),
            disable: config.disable.iter().cloned().collect(),
            settings: config.settings.clone(),
        }
    }

    /// Effective activation decision for `id`.
    pub fn decide(&self, id: &str) -> Activation {
        if self.disable.contains(id) {
            Activation::Denied {
                reason: "listed in plugins.disable".to_string(),
            }
        } else if !self.enable.is_empty() && !self.enable.contains(id) {
            Activation::Denied {
                reason: "not listed in plugins.enable".to_string(),
            }
        } else {
            Activation::Allowed
        }
    }

    /// Settings for `id`: an empty map overlaid with the configured values.
    pub fn settings_for(&self, id: &str) -> Settings {
        let mut settings = Settings::new();
        if let Some(overrides) = self.settings.get(id) {
            settings.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        settings
    }
}

impl From<&PluginsConfig> for ConfigResolver {
    fn from(config: &PluginsConfig) -> Self {
        Self::new(config)
    }
}
