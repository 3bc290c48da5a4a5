// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Candidate discovery across the Builtin, User and ProjectLocal tiers.
//!
//! Sources only report what they find. Collapsing duplicate ids by tier
//! precedence happens in [`resolve_precedence`], and nothing here touches
//! the registry.

pub mod directory;
pub mod static_source;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use repokit_config::PluginsConfig;
use repokit_core::{CapabilitySet, PluginFactory, PluginMetadata, RepokitError, Tier};
use tracing::{debug, info, warn};

pub use directory::{DirectorySource, FactoryTable};
pub use static_source::StaticSource;

/// How a candidate's instance gets built.
#[derive(Clone)]
pub enum Constructor {
    /// A resolved factory.
    Factory(Arc<dyn PluginFactory>),
    /// A manifest named a factory that is not compiled in. Fails at load.
    Unresolved { name: String },
}

impl std::fmt::Debug for Constructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constructor::Factory(_) => f.write_str("Factory(..)"),
            Constructor::Unresolved { name } => {
                f.debug_struct("Unresolved").field("name", name).finish()
            }
        }
    }
}

/// A plugin found by a source, before validation.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub tier: Tier,
    /// Where the candidate was found (manifest path or source name).
    pub origin: String,
    pub metadata: PluginMetadata,
    pub capabilities: CapabilitySet,
    pub constructor: Constructor,
}

/// A location that yields plugin candidates.
#[async_trait]
pub trait PluginSource: Send + Sync {
    /// Tier this source contributes to.
    fn tier(&self) -> Tier;

    /// Human-readable location for logs and errors.
    fn location(&self) -> String;

    /// Enumerate candidates. An `Err` means the location itself was unreadable.
    async fn scan(&self) -> Result<Vec<Candidate>, RepokitError>;
}

/// Outcome of scanning every source once.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Candidates in ascending precedence order.
    pub candidates: Vec<Candidate>,
    /// Locations that could not be read.
    pub errors: Vec<RepokitError>,
}

/// Scans an ordered set of sources.
pub struct DiscoveryScanner {
    sources: Vec<Box<dyn PluginSource>>,
}

impl DiscoveryScanner {
    /// Sources are ordered by tier; the given order is kept within a tier.
    pub fn new(mut sources: Vec<Box<dyn PluginSource>>) -> Self {
        sources.sort_by_key(|s| s.tier());
        Self { sources }
    }

    pub fn sources(&self) -> impl Iterator<Item = &dyn PluginSource> {
        self.sources.iter().map(|s| s.as_ref())
    }

    /// Scan all sources concurrently. An unreadable source is logged and
    /// skipped; it never aborts the other sources.
    pub async fn scan(&self) -> DiscoveryReport {
        let results = futures::future::join_all(self.sources.iter().map(|s| s.scan())).await;

        let mut report = DiscoveryReport::default();
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(found) => {
                    debug!(
                        tier = %source.tier(),
                        location = %source.location(),
                        count = found.len(),
                        "scanned plugin source"
                    );
                    report.candidates.extend(found);
                }
                Err(e) => {
                    warn!(
                        tier = %source.tier(),
                        location = %source.location(),
                        error = %e,
                        "skipping unreadable plugin source"
                    );
                    report.errors.push(e);
                }
            }
        }
        report
    }
}

/// Collapse candidates sharing an id so that exactly one survives per id.
///
/// `candidates` must be in ascending precedence order; a later candidate
/// replaces an earlier one. Candidates without an id are dropped. Output is
/// sorted by id.
pub fn resolve_precedence(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut winners: BTreeMap<String, Candidate> = BTreeMap::new();
    for candidate in candidates {
        if candidate.metadata.id.is_empty() {
            warn!(origin = %candidate.origin, "dropping plugin candidate without an id");
            continue;
        }
        if let Some(previous) = winners.get(&candidate.metadata.id) {
            info!(
                plugin = %candidate.metadata.id,
                overridden_tier = %previous.tier,
                overridden_version = %previous.metadata.version,
                tier = %candidate.tier,
                version = %candidate.metadata.version,
                "plugin overridden by higher-precedence candidate"
            );
        }
        winners.insert(candidate.metadata.id.clone(), candidate);
    }
    winners.into_values().collect()
}

/// The directory sources named by `config`: the built-in directory when set,
/// the user directory and the project-local directory.
pub fn directory_sources(
    config: &PluginsConfig,
    factories: Arc<FactoryTable>,
) -> Vec<Box<dyn PluginSource>> {
    let mut sources: Vec<Box<dyn PluginSource>> = Vec::new();
    if let Some(dir) = config.builtin_plugin_dir() {
        sources.push(Box::new(DirectorySource::new(
            Tier::Builtin,
            dir,
            factories.clone(),
        )));
    }
    if let Some(dir) = config.user_plugin_dir() {
        sources.push(Box::new(DirectorySource::new(
            Tier::User,
            dir,
            factories.clone(),
        )));
    }
    sources.push(Box::new(DirectorySource::new(
        Tier::ProjectLocal,
        config.project_dir.clone(),
        factories,
    )));
    sources
}
