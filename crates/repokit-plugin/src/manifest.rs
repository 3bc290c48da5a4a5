// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin manifest parsing from `plugin.toml` files.
//!
//! A manifest declares a plugin's identity, the capabilities it claims and
//! the name of the compiled-in factory that constructs it.

use std::str::FromStr;

use repokit_core::{Capability, CapabilitySet, PluginMetadata, RepokitError};
use serde::Deserialize;

/// Parsed `plugin.toml`.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginManifest {
    pub metadata: PluginMetadata,
    pub capabilities: CapabilitySet,
    /// Factory name to resolve; `None` means "same as the id".
    pub factory: Option<String>,
}

impl PluginManifest {
    /// Factory name used for lookup in a factory table.
    pub fn factory_name(&self) -> &str {
        self.factory.as_deref().unwrap_or(&self.metadata.id)
    }
}

/// Intermediate TOML deserialization struct for `plugin.toml`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PluginManifestFile {
    plugin: PluginSection,
}

/// The `[plugin]` section of a `plugin.toml` file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PluginSection {
    id: String,
    name: String,
    version: String,
    description: String,
    author: Option<String>,
    homepage: Option<String>,
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default)]
    capabilities: Vec<String>,
    factory: Option<String>,
}

/// Parse a plugin manifest from TOML content.
///
/// Only structural problems are reported here (syntax, missing required
/// fields, unknown capability names). Identity rules are checked later by
/// [`validate_metadata`](crate::validate::validate_metadata).
pub fn parse_plugin_manifest(toml_content: &str) -> Result<PluginManifest, RepokitError> {
    let file: PluginManifestFile = toml::from_str(toml_content)
        .map_err(|e| RepokitError::Config(format!("invalid plugin manifest: {e}")))?;
    let section = file.plugin;

    let capabilities = section
        .capabilities
        .iter()
        .map(|name| {
            Capability::from_str(name).map_err(|_| {
                RepokitError::Config(format!(
                    "plugin manifest: unknown capability '{name}'. Expected one of: platform, analysis, synthesis, post-processing"
                ))
            })
        })
        .collect::<Result<CapabilitySet, _>>()?;

    let mut metadata =
        PluginMetadata::new(section.id, section.name, section.version, section.description)
            .with_requires(section.requires);
    metadata.author = section.author;
    metadata.homepage = section.homepage;

    Ok(PluginManifest {
        metadata,
        capabilities,
        factory: section.factory,
    })
}
