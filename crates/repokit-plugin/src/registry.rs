// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The plugin registry: owner of the id -> record index.
//!
//! Readers load the current index snapshot without locking. Writers
//! (`enable`, `disable`, `reload`, `shutdown`) are serialized by a mutex,
//! work on a private copy of the index and publish it in one swap when they
//! finish, so a partially applied change is never observable.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use arc_swap::ArcSwap;
use repokit_config::PluginsConfig;
use repokit_core::{
    Capability, CapabilitySet, DependencyFailure, Plugin, PluginMetadata, PluginState,
    PluginStatus, RepokitError, Settings, Tier,
};
use serde::Serialize;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

use crate::activation::{Activation, ConfigResolver};
use crate::discovery::{Candidate, Constructor, DiscoveryScanner, PluginSource, resolve_precedence};
use crate::events::{EVENT_CHANNEL_CAPACITY, LifecycleEvent};
use crate::lifecycle::LifecycleManager;
use crate::resolver::resolve;
use crate::validate::validate_metadata;

/// Diagnostic stored on a record after a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordError {
    /// Short label from [`RepokitError::kind`].
    pub kind: String,
    pub message: String,
}

impl From<&RepokitError> for RecordError {
    fn from(err: &RepokitError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Registry-owned state for one plugin id.
#[derive(Clone, Serialize)]
pub struct PluginRecord {
    pub metadata: PluginMetadata,
    /// Capabilities the plugin declared.
    pub capabilities: CapabilitySet,
    /// Declared capabilities the loaded instance implements. Empty until loaded.
    pub verified_capabilities: CapabilitySet,
    pub tier: Tier,
    /// Manifest path or registration table the winning candidate came from.
    pub origin: String,
    pub state: PluginState,
    pub settings: Settings,
    pub last_error: Option<RecordError>,
    #[serde(skip)]
    constructor: Constructor,
    #[serde(skip)]
    instance: Option<Arc<dyn Plugin>>,
}

impl PluginRecord {
    fn new(candidate: Candidate, settings: Settings) -> Self {
        Self {
            metadata: candidate.metadata,
            capabilities: candidate.capabilities,
            verified_capabilities: CapabilitySet::new(),
            tier: candidate.tier,
            origin: candidate.origin,
            state: PluginState::Discovered,
            settings,
            last_error: None,
            constructor: candidate.constructor,
            instance: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn is_enabled(&self) -> bool {
        self.state == PluginState::Enabled
    }

    /// Whether an instance is held, i.e. the load hook succeeded and the
    /// unload hook has not run yet.
    pub fn is_loaded(&self) -> bool {
        self.instance.is_some()
    }

    pub fn status(&self) -> PluginStatus {
        self.state.status()
    }

    pub fn summary(&self) -> PluginSummary {
        PluginSummary {
            id: self.metadata.id.clone(),
            name: self.metadata.name.clone(),
            version: self.metadata.version.clone(),
            enabled: self.is_enabled(),
            state: self.state,
            status: self.status(),
        }
    }
}

impl std::fmt::Debug for PluginRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRecord")
            .field("id", &self.metadata.id)
            .field("version", &self.metadata.version)
            .field("tier", &self.tier)
            .field("state", &self.state)
            .field("capabilities", &self.capabilities)
            .field("last_error", &self.last_error)
            .field("loaded", &self.instance.is_some())
            .finish()
    }
}

/// One row of [`PluginRegistry::list`], shaped for a status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginSummary {
    pub id: String,
    pub name: String,
    pub version: String,
    pub enabled: bool,
    pub state: PluginState,
    pub status: PluginStatus,
}

/// Counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistrySummary {
    pub total: usize,
    pub active: usize,
    pub disabled: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default)]
struct RegistryIndex {
    records: BTreeMap<String, PluginRecord>,
    /// Ids in the order their load hooks succeeded.
    load_order: Vec<String>,
    generation: u64,
}

impl RegistryIndex {
    fn summary(&self) -> RegistrySummary {
        let mut summary = RegistrySummary {
            total: self.records.len(),
            ..RegistrySummary::default()
        };
        for record in self.records.values() {
            match record.status() {
                PluginStatus::Active => summary.active += 1,
                PluginStatus::Disabled => summary.disabled += 1,
                PluginStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// Every `requires` entry of `id` must name an enabled record.
    fn check_dependencies(&self, id: &str, requires: &[String]) -> Result<(), RepokitError> {
        for dependency in requires {
            let failure = match self.records.get(dependency) {
                None => DependencyFailure::Missing {
                    dependency: dependency.clone(),
                },
                Some(record) if !record.is_enabled() => DependencyFailure::Inactive {
                    dependency: dependency.clone(),
                },
                Some(_) => continue,
            };
            return Err(RepokitError::Dependency {
                id: id.to_string(),
                failure,
            });
        }
        Ok(())
    }
}

/// State only writers touch.
#[derive(Debug, Default)]
struct WriterState {
    /// Ids disabled through [`PluginRegistry::disable`]. Survives reloads.
    runtime_disabled: BTreeSet<String>,
}

/// Central authority over discovered plugins.
pub struct PluginRegistry {
    index: ArcSwap<RegistryIndex>,
    writer: Mutex<WriterState>,
    config: ConfigResolver,
    scanner: DiscoveryScanner,
    lifecycle: LifecycleManager,
    events: broadcast::Sender<LifecycleEvent>,
}

impl PluginRegistry {
    /// Create an empty registry. Nothing is discovered until [`reload`](Self::reload).
    pub fn new(config: PluginsConfig, sources: Vec<Box<dyn PluginSource>>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            index: ArcSwap::from_pointee(RegistryIndex::default()),
            writer: Mutex::new(WriterState::default()),
            lifecycle: LifecycleManager::new(config.hook_timeout()),
            config: ConfigResolver::new(&config),
            scanner: DiscoveryScanner::new(sources),
            events,
        }
    }

    /// Create a registry and run the first discovery and activation pass.
    pub async fn start(config: PluginsConfig, sources: Vec<Box<dyn PluginSource>>) -> Self {
        let registry = Self::new(config, sources);
        registry.reload().await;
        registry
    }

    // --- Reads ---

    /// Status rows for every registered plugin, sorted by id.
    pub fn list(&self) -> Vec<PluginSummary> {
        self.index
            .load()
            .records
            .values()
            .map(PluginRecord::summary)
            .collect()
    }

    pub fn get(&self, id: &str) -> Result<PluginRecord, RepokitError> {
        self.index
            .load()
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// The instance behind an enabled plugin.
    pub fn plugin(&self, id: &str) -> Option<Arc<dyn Plugin>> {
        self.index
            .load()
            .records
            .get(id)
            .filter(|r| r.is_enabled())
            .and_then(|r| r.instance.clone())
    }

    /// Enabled plugins verified for `capability`, in load order.
    pub fn with_capability(&self, capability: Capability) -> Vec<(String, Arc<dyn Plugin>)> {
        let index = self.index.load();
        index
            .load_order
            .iter()
            .filter_map(|id| index.records.get(id))
            .filter(|r| r.is_enabled() && r.verified_capabilities.contains(capability))
            .filter_map(|r| r.instance.clone().map(|i| (r.metadata.id.clone(), i)))
            .collect()
    }

    /// First enabled platform plugin that claims `url`.
    pub fn platform_for(&self, url: &str) -> Option<Arc<dyn Plugin>> {
        self.with_capability(Capability::Platform)
            .into_iter()
            .map(|(_, plugin)| plugin)
            .find(|plugin| plugin.as_platform().is_some_and(|p| p.supports(url)))
    }

    pub fn summary(&self) -> RegistrySummary {
        self.index.load().summary()
    }

    /// Number of completed reloads.
    pub fn generation(&self) -> u64 {
        self.index.load().generation
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    // --- Writes ---

    /// Enable a disabled plugin, loading it first if it was never loaded.
    ///
    /// Fails without changing anything when the configuration forbids the id
    /// or a dependency is not enabled. A no-op on an enabled plugin.
    pub async fn enable(&self, id: &str) -> Result<(), RepokitError> {
        let mut writer = self.writer.lock().await;
        let mut index = RegistryIndex::clone(&self.index.load());
        let mut events = Vec::new();

        let record = index.records.get(id).ok_or_else(|| not_found(id))?;
        match record.state {
            PluginState::Enabled => return Ok(()),
            PluginState::Failed => return Err(stored_failure(record)),
            _ => {}
        }
        if let Activation::Denied { reason } = self.config.decide(id) {
            return Err(RepokitError::ActivationDenied {
                id: id.to_string(),
                reason,
            });
        }
        let requires = record.metadata.requires.clone();
        index.check_dependencies(id, &requires)?;

        writer.runtime_disabled.remove(id);
        let record = index.records.get_mut(id).ok_or_else(|| not_found(id))?;
        let result = if record.is_loaded() {
            self.transition(&mut events, record, PluginState::Enabled, Some("enabled at runtime"));
            Ok(())
        } else {
            self.load_record(&mut events, record, &mut index.load_order).await
        };

        self.publish(index, events);
        result
    }

    /// Disable an enabled plugin. The instance stays loaded until the next
    /// reload or shutdown. A no-op on a disabled plugin.
    pub async fn disable(&self, id: &str) -> Result<(), RepokitError> {
        let mut writer = self.writer.lock().await;
        let mut index = RegistryIndex::clone(&self.index.load());
        let mut events = Vec::new();

        let record = index.records.get(id).ok_or_else(|| not_found(id))?;
        match record.state {
            PluginState::Disabled => return Ok(()),
            PluginState::Failed => return Err(stored_failure(record)),
            _ => {}
        }

        let dependents: Vec<&str> = index
            .records
            .values()
            .filter(|r| r.is_enabled() && r.metadata.requires.iter().any(|d| d == id))
            .map(PluginRecord::id)
            .collect();
        if !dependents.is_empty() {
            warn!(
                plugin = id,
                dependents = %dependents.join(","),
                "disabling a plugin that enabled plugins depend on"
            );
        }

        writer.runtime_disabled.insert(id.to_string());
        let record = index.records.get_mut(id).ok_or_else(|| not_found(id))?;
        self.transition(&mut events, record, PluginState::Disabled, Some("disabled at runtime"));

        self.publish(index, events);
        Ok(())
    }

    /// Rediscover everything and rebuild the index.
    ///
    /// Previously loaded plugins are unloaded in reverse load order, then
    /// fresh candidates are validated and activated in dependency order.
    /// Each plugin succeeds or fails on its own.
    pub async fn reload(&self) -> RegistrySummary {
        let writer = self.writer.lock().await;
        let report = self.scanner.scan().await;
        let mut events = Vec::new();

        let mut previous = RegistryIndex::clone(&self.index.load());
        self.unload_all(&mut events, &mut previous).await;

        let mut next = RegistryIndex {
            generation: previous.generation + 1,
            ..RegistryIndex::default()
        };
        for candidate in resolve_precedence(report.candidates) {
            let record = self.admit(&mut events, candidate);
            next.records.insert(record.metadata.id.clone(), record);
        }
        self.activate_all(&mut events, &mut next, &writer).await;

        let summary = next.summary();
        let generation = next.generation;
        events.push(LifecycleEvent::Reloaded { generation });
        self.publish(next, events);
        info!(
            generation,
            total = summary.total,
            active = summary.active,
            disabled = summary.disabled,
            failed = summary.failed,
            discovery_errors = report.errors.len(),
            "plugin registry reloaded"
        );
        summary
    }

    /// Unload every loaded plugin in reverse load order and empty the index.
    /// Calling it again does nothing.
    pub async fn shutdown(&self) {
        let _writer = self.writer.lock().await;
        let mut index = RegistryIndex::clone(&self.index.load());
        if index.records.is_empty() {
            return;
        }
        let unloaded = index.load_order.len();
        let mut events = Vec::new();
        self.unload_all(&mut events, &mut index).await;
        self.publish(
            RegistryIndex {
                generation: index.generation,
                ..RegistryIndex::default()
            },
            events,
        );
        info!(unloaded, "plugin registry shut down");
    }

    // --- Internals ---

    /// Swap in `index`, then broadcast the transitions that produced it, so
    /// subscribers never see an event ahead of the snapshot.
    fn publish(&self, index: RegistryIndex, events: Vec<LifecycleEvent>) {
        self.index.store(Arc::new(index));
        for event in events {
            let _ = self.events.send(event);
        }
    }

    fn admit(&self, events: &mut Vec<LifecycleEvent>, candidate: Candidate) -> PluginRecord {
        let settings = self.config.settings_for(&candidate.metadata.id);
        let mut record = PluginRecord::new(candidate, settings);
        match validate_metadata(&record.metadata, &record.capabilities) {
            Ok(()) => self.transition(events, &mut record, PluginState::Validated, None),
            Err(e) => self.fail(events, &mut record, &e),
        }
        record
    }

    async fn activate_all(
        &self,
        events: &mut Vec<LifecycleEvent>,
        index: &mut RegistryIndex,
        writer: &WriterState,
    ) {
        let graph: BTreeMap<String, Vec<String>> = index
            .records
            .values()
            .filter(|r| r.state == PluginState::Validated)
            .map(|r| (r.metadata.id.clone(), r.metadata.requires.clone()))
            .collect();
        let resolution = resolve(&graph);

        for members in &resolution.cycles {
            for id in members {
                let err = RepokitError::Dependency {
                    id: id.clone(),
                    failure: DependencyFailure::Cycle {
                        members: members.clone(),
                    },
                };
                if let Some(record) = index.records.get_mut(id) {
                    self.fail(events, record, &err);
                }
            }
        }

        for id in &resolution.order {
            let activation = if writer.runtime_disabled.contains(id) {
                Activation::Denied {
                    reason: "disabled at runtime".to_string(),
                }
            } else {
                self.config.decide(id)
            };
            let dependencies = match index.records.get(id) {
                Some(record) => index.check_dependencies(id, &record.metadata.requires),
                None => continue,
            };
            let Some(record) = index.records.get_mut(id) else {
                continue;
            };

            if let Activation::Denied { reason } = activation {
                self.transition(events, record, PluginState::Disabled, Some(reason.as_str()));
            } else if let Err(e) = dependencies {
                warn!(plugin = %id, error = %e, "plugin held back by unmet dependency");
                record.last_error = Some(RecordError::from(&e));
                self.transition(
                    events,
                    record,
                    PluginState::Disabled,
                    Some(e.to_string().as_str()),
                );
            } else {
                // Failure is recorded on the record; siblings carry on.
                let _ = self.load_record(events, record, &mut index.load_order).await;
            }
        }
    }

    async fn load_record(
        &self,
        events: &mut Vec<LifecycleEvent>,
        record: &mut PluginRecord,
        load_order: &mut Vec<String>,
    ) -> Result<(), RepokitError> {
        let loaded = self
            .lifecycle
            .load(
                &record.metadata.id,
                &record.constructor,
                &record.capabilities,
                &record.settings,
            )
            .await;
        match loaded {
            Ok(loaded) => {
                record.instance = Some(loaded.instance);
                record.verified_capabilities = loaded.verified;
                record.last_error = None;
                self.transition(events, record, PluginState::Loaded, None);
                self.transition(events, record, PluginState::Enabled, None);
                load_order.push(record.metadata.id.clone());
                info!(
                    plugin = %record.metadata.id,
                    version = %record.metadata.version,
                    tier = %record.tier,
                    "plugin loaded"
                );
                Ok(())
            }
            Err(e) => {
                self.fail(events, record, &e);
                Err(e)
            }
        }
    }

    async fn unload_all(&self, events: &mut Vec<LifecycleEvent>, index: &mut RegistryIndex) {
        let order = std::mem::take(&mut index.load_order);
        for id in order.iter().rev() {
            let Some(record) = index.records.get_mut(id) else {
                continue;
            };
            // Taking the instance is what makes unload at-most-once.
            let Some(instance) = record.instance.take() else {
                continue;
            };
            match self.lifecycle.unload(id, instance).await {
                Ok(()) => {
                    self.transition(events, record, PluginState::Unloaded, None);
                    debug!(plugin = %id, "plugin unloaded");
                }
                Err(e) => self.fail(events, record, &e),
            }
        }
    }

    fn fail(&self, events: &mut Vec<LifecycleEvent>, record: &mut PluginRecord, err: &RepokitError) {
        warn!(plugin = %record.metadata.id, kind = err.kind(), error = %err, "plugin failed");
        record.last_error = Some(RecordError::from(err));
        self.transition(events, record, PluginState::Failed, Some(err.to_string().as_str()));
    }

    /// Apply a state change to the private copy and queue its event.
    fn transition(
        &self,
        events: &mut Vec<LifecycleEvent>,
        record: &mut PluginRecord,
        to: PluginState,
        reason: Option<&str>,
    ) {
        let from = record.state;
        if from == to {
            return;
        }
        if !from.can_transition_to(to) {
            warn!(plugin = %record.metadata.id, %from, %to, "ignoring invalid state transition");
            return;
        }
        record.state = to;
        debug!(plugin = %record.metadata.id, %from, %to, reason = reason.unwrap_or(""), "plugin state changed");
        events.push(LifecycleEvent::Transition {
            id: record.metadata.id.clone(),
            from,
            to,
            reason: reason.map(str::to_string),
        });
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let index = self.index.load();
        f.debug_struct("PluginRegistry")
            .field("generation", &index.generation)
            .field("plugins", &index.records.len())
            .field("config", &self.config)
            .field("hook_timeout", &self.lifecycle.hook_timeout())
            .finish()
    }
}

fn not_found(id: &str) -> RepokitError {
    RepokitError::NotFound { id: id.to_string() }
}

fn stored_failure(record: &PluginRecord) -> RepokitError {
    RepokitError::Load {
        id: record.metadata.id.clone(),
        message: record
            .last_error
            .as_ref()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| "plugin is in the failed state".to_string()),
    }
}
