// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for registry integration tests.
//!
//! `RegistryHarness` wires mock plugins into static sources at each tier,
//! sharing one [`Journal`] so hook calls can be asserted on afterwards.

use std::sync::Arc;
use std::time::Duration;

use repokit_config::PluginsConfig;
use repokit_core::{CapabilitySet, PluginMetadata, Tier};
use repokit_plugin::{PluginRegistry, PluginSource, StaticSource};

use crate::mock_plugin::{Journal, MockPlugin};

/// Metadata with a name and description derived from the id.
pub fn metadata(id: &str, version: &str) -> PluginMetadata {
    PluginMetadata::new(id, format!("{id} plugin"), version, format!("{id} test plugin"))
}

/// Builder for a registry over mock plugins.
pub struct RegistryHarnessBuilder {
    builtin: StaticSource,
    user: StaticSource,
    project: StaticSource,
    extra: Vec<Box<dyn PluginSource>>,
    config: PluginsConfig,
    journal: Arc<Journal>,
}

impl RegistryHarnessBuilder {
    fn new() -> Self {
        Self {
            builtin: StaticSource::new(Tier::Builtin, "harness-builtin"),
            user: StaticSource::new(Tier::User, "harness-user"),
            project: StaticSource::new(Tier::ProjectLocal, "harness-project"),
            extra: Vec::new(),
            config: PluginsConfig {
                hook_timeout_ms: 200,
                ..PluginsConfig::default()
            },
            journal: Journal::new(),
        }
    }

    /// Register `plugin` at `tier` with the given declared capabilities.
    /// The plugin is rewired to the harness journal.
    pub fn plugin(
        mut self,
        tier: Tier,
        metadata: PluginMetadata,
        declared: CapabilitySet,
        plugin: MockPlugin,
    ) -> Self {
        let factory = plugin.with_journal(self.journal.clone()).factory();
        let source = match tier {
            Tier::Builtin => &mut self.builtin,
            Tier::User => &mut self.user,
            Tier::ProjectLocal => &mut self.project,
        };
        source.register(metadata, declared, factory);
        self
    }

    /// Register a plugin that implements exactly what it declares.
    pub fn honest(self, tier: Tier, metadata: PluginMetadata, declared: CapabilitySet) -> Self {
        let plugin = MockPlugin::new(metadata.id.clone()).exposing_all(&declared);
        self.plugin(tier, metadata, declared, plugin)
    }

    /// Add a non-mock source, e.g. a directory source.
    pub fn with_source(mut self, source: Box<dyn PluginSource>) -> Self {
        self.extra.push(source);
        self
    }

    pub fn with_config(mut self, config: PluginsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_hook_timeout(mut self, timeout: Duration) -> Self {
        self.config.hook_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn enable_only<I: IntoIterator<Item = &'static str>>(mut self, ids: I) -> Self {
        self.config.enable = ids.into_iter().map(str::to_string).collect();
        self
    }

    pub fn disable<I: IntoIterator<Item = &'static str>>(mut self, ids: I) -> Self {
        self.config.disable = ids.into_iter().map(str::to_string).collect();
        self
    }

    /// Build the registry without running discovery.
    pub fn build(self) -> RegistryHarness {
        let mut sources: Vec<Box<dyn PluginSource>> = vec![
            Box::new(self.builtin),
            Box::new(self.user),
            Box::new(self.project),
        ];
        sources.extend(self.extra);
        RegistryHarness {
            registry: PluginRegistry::new(self.config, sources),
            journal: self.journal,
        }
    }

    /// Build the registry and run the first reload.
    pub async fn start(self) -> RegistryHarness {
        let harness = self.build();
        harness.registry.reload().await;
        harness
    }
}

/// A registry plus the journal its mock plugins write to.
#[derive(Debug)]
pub struct RegistryHarness {
    pub registry: PluginRegistry,
    pub journal: Arc<Journal>,
}

impl RegistryHarness {
    pub fn builder() -> RegistryHarnessBuilder {
        RegistryHarnessBuilder::new()
    }
}
