// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manifest directory source: `<dir>/<entry>/plugin.toml`.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use repokit_core::{PluginFactory, RepokitError, Tier};
use tracing::{debug, warn};

use super::{Candidate, Constructor, PluginSource};
use crate::manifest::parse_plugin_manifest;

/// Manifest file looked up in each plugin directory.
pub const MANIFEST_FILE: &str = "plugin.toml";

/// Compiled-in factories that manifests may name.
#[derive(Default, Clone)]
pub struct FactoryTable {
    factories: HashMap<String, Arc<dyn PluginFactory>>,
}

impl FactoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, factory: Arc<dyn PluginFactory>) {
        self.factories.insert(name.into(), factory);
    }

    pub fn with(mut self, name: impl Into<String>, factory: Arc<dyn PluginFactory>) -> Self {
        self.register(name, factory);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PluginFactory>> {
        self.factories.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for FactoryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("FactoryTable").field("factories", &names).finish()
    }
}

/// Scans one directory of plugin subdirectories.
#[derive(Debug)]
pub struct DirectorySource {
    tier: Tier,
    dir: PathBuf,
    factories: Arc<FactoryTable>,
}

impl DirectorySource {
    pub fn new(tier: Tier, dir: impl Into<PathBuf>, factories: Arc<FactoryTable>) -> Self {
        Self {
            tier,
            dir: dir.into(),
            factories,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn discovery_error(&self, source: std::io::Error) -> RepokitError {
        RepokitError::Discovery {
            location: self.location(),
            source: Box::new(source),
        }
    }

    async fn read_candidate(&self, manifest_path: &Path) -> Option<Candidate> {
        let content = match tokio::fs::read_to_string(manifest_path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %manifest_path.display(), error = %e, "skipping unreadable plugin manifest");
                return None;
            }
        };
        let manifest = match parse_plugin_manifest(&content) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(path = %manifest_path.display(), error = %e, "skipping malformed plugin manifest");
                return None;
            }
        };

        let factory_name = manifest.factory_name().to_string();
        let constructor = match self.factories.get(&factory_name) {
            Some(factory) => Constructor::Factory(factory),
            None => Constructor::Unresolved { name: factory_name },
        };

        Some(Candidate {
            tier: self.tier,
            origin: manifest_path.display().to_string(),
            metadata: manifest.metadata,
            capabilities: manifest.capabilities,
            constructor,
        })
    }
}

#[async_trait]
impl PluginSource for DirectorySource {
    fn tier(&self) -> Tier {
        self.tier
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }

    async fn scan(&self) -> Result<Vec<Candidate>, RepokitError> {
        let metadata = match tokio::fs::metadata(&self.dir).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(tier = %self.tier, dir = %self.dir.display(), "plugin directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.discovery_error(e)),
        };
        if !metadata.is_dir() {
            return Err(self.discovery_error(std::io::Error::new(
                ErrorKind::InvalidInput,
                "not a directory",
            )));
        }

        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| self.discovery_error(e))?;
        let mut manifests = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| self.discovery_error(e))?
        {
            let manifest_path = entry.path().join(MANIFEST_FILE);
            if tokio::fs::try_exists(&manifest_path).await.unwrap_or(false) {
                manifests.push(manifest_path);
            }
        }
        // read_dir order is platform-dependent.
        manifests.sort();

        let mut candidates = Vec::with_capacity(manifests.len());
        for manifest_path in &manifests {
            if let Some(candidate) = self.read_candidate(manifest_path).await {
                candidates.push(candidate);
            }
        }
        Ok(candidates)
    }
}
