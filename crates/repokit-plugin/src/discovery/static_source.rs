// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process registration table for compiled-in plugins.

use std::sync::Arc;

use async_trait::async_trait;
use repokit_core::{CapabilitySet, PluginFactory, PluginMetadata, RepokitError, Tier};

use super::{Candidate, Constructor, PluginSource};

/// A fixed list of plugins registered in code.
pub struct StaticSource {
    tier: Tier,
    name: String,
    entries: Vec<(PluginMetadata, CapabilitySet, Arc<dyn PluginFactory>)>,
}

impl StaticSource {
    pub fn new(tier: Tier, name: impl Into<String>) -> Self {
        Self {
            tier,
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn register(
        &mut self,
        metadata: PluginMetadata,
        capabilities: CapabilitySet,
        factory: Arc<dyn PluginFactory>,
    ) {
        self.entries.push((metadata, capabilities, factory));
    }

    pub fn with(
        mut self,
        metadata: PluginMetadata,
        capabilities: CapabilitySet,
        factory: Arc<dyn PluginFactory>,
    ) -> Self {
        self.register(metadata, capabilities, factory);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for StaticSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.entries.iter().map(|(m, _, _)| m.id.as_str()).collect();
        f.debug_struct("StaticSource")
            .field("tier", &self.tier)
            .field("name", &self.name)
            .field("entries", &ids)
            .finish()
    }
}

#[async_trait]
impl PluginSource for StaticSource {
    fn tier(&self) -> Tier {
        self.tier
    }

    fn location(&self) -> String {
        self.name.clone()
    }

    async fn scan(&self) -> Result<Vec<Candidate>, RepokitError> {
        Ok(self
            .entries
            .iter()
            .map(|(metadata, capabilities, factory)| Candidate {
                tier: self.tier,
                origin: format!("{}:{}", self.name, metadata.id),
                metadata: metadata.clone(),
                capabilities: capabilities.clone(),
                constructor: Constructor::Factory(factory.clone()),
            })
            .collect())
    }
}
