// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock plugin with scriptable lifecycle hooks.
//!
//! `MockPlugin` can expose any combination of the four capability traits and
//! records every hook invocation in a shared [`Journal`], so tests can assert
//! on call counts and ordering across plugins.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use repokit_core::types::{
    AnalysisReport, Artifact, GeneratedFile, GeneratedProject, RepositoryAnalysis,
    RepositoryDescriptor, Score, SearchOptions, SynthesisRequest,
};
use repokit_core::{
    AnalysisPlugin, Capability, CapabilitySet, PlatformPlugin, Plugin, PluginContext,
    PluginFactory, PostProcessingPlugin, RepokitError, Settings, SynthesisPlugin,
};
use serde_json::json;

/// What a lifecycle hook does when invoked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HookBehavior {
    #[default]
    Succeed,
    Fail(String),
    /// Never completes.
    Hang,
    Panic,
}

/// One recorded hook call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    Load(String),
    Unload(String),
}

/// Shared record of hook invocations.
#[derive(Debug, Default)]
pub struct Journal {
    entries: Mutex<Vec<JournalEntry>>,
    settings: Mutex<BTreeMap<String, Settings>>,
}

impl Journal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, entry: JournalEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }

    /// All hook calls so far, in invocation order.
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn loads(&self, id: &str) -> usize {
        self.entries()
            .iter()
            .filter(|e| matches!(e, JournalEntry::Load(x) if x == id))
            .count()
    }

    pub fn unloads(&self, id: &str) -> usize {
        self.entries()
            .iter()
            .filter(|e| matches!(e, JournalEntry::Unload(x) if x == id))
            .count()
    }

    /// Ids in the order their unload hooks ran.
    pub fn unload_order(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                JournalEntry::Unload(id) => Some(id),
                JournalEntry::Load(_) => None,
            })
            .collect()
    }

    /// Settings the most recent load hook of `id` received.
    pub fn settings_seen(&self, id: &str) -> Option<Settings> {
        self.settings.lock().ok()?.get(id).cloned()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
        if let Ok(mut settings) = self.settings.lock() {
            settings.clear();
        }
    }
}

/// A scriptable plugin.
#[derive(Debug, Clone)]
pub struct MockPlugin {
    id: String,
    exposes: CapabilitySet,
    on_load: HookBehavior,
    on_unload: HookBehavior,
    hosts: Vec<String>,
    journal: Arc<Journal>,
}

impl MockPlugin {
    /// A plugin exposing no capability traits with succeeding hooks.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            exposes: CapabilitySet::new(),
            on_load: HookBehavior::Succeed,
            on_unload: HookBehavior::Succeed,
            hosts: Vec::new(),
            journal: Journal::new(),
        }
    }

    /// Implement the trait behind `capability`.
    pub fn exposing(mut self, capability: Capability) -> Self {
        self.exposes.insert(capability);
        self
    }

    pub fn exposing_all(mut self, capabilities: &CapabilitySet) -> Self {
        for capability in capabilities.iter() {
            self.exposes.insert(capability);
        }
        self
    }

    pub fn load_behavior(mut self, behavior: HookBehavior) -> Self {
        self.on_load = behavior;
        self
    }

    pub fn unload_behavior(mut self, behavior: HookBehavior) -> Self {
        self.on_unload = behavior;
        self
    }

    /// URLs containing `host` are claimed by the platform capability.
    pub fn supporting(mut self, host: impl Into<String>) -> Self {
        self.hosts.push(host.into());
        self
    }

    pub fn with_journal(mut self, journal: Arc<Journal>) -> Self {
        self.journal = journal;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn journal(&self) -> Arc<Journal> {
        self.journal.clone()
    }

    /// A factory producing a fresh clone on each call.
    pub fn factory(self) -> Arc<dyn PluginFactory> {
        Arc::new(move |_: &Settings| -> Result<Arc<dyn Plugin>, RepokitError> {
            Ok(Arc::new(self.clone()))
        })
    }

    async fn run(&self, behavior: &HookBehavior) -> Result<(), RepokitError> {
        match behavior {
            HookBehavior::Succeed => Ok(()),
            HookBehavior::Fail(message) => Err(RepokitError::operation(&self.id, message.clone())),
            HookBehavior::Hang => std::future::pending().await,
            HookBehavior::Panic => panic!("mock plugin {} panicked", self.id),
        }
    }
}

#[async_trait]
impl Plugin for MockPlugin {
    async fn on_load(&self, ctx: &PluginContext) -> Result<(), RepokitError> {
        self.journal.push(JournalEntry::Load(self.id.clone()));
        if let Ok(mut settings) = self.journal.settings.lock() {
            settings.insert(self.id.clone(), ctx.settings.clone());
        }
        self.run(&self.on_load).await
    }

    async fn on_unload(&self) -> Result<(), RepokitError> {
        self.journal.push(JournalEntry::Unload(self.id.clone()));
        self.run(&self.on_unload).await
    }

    fn as_platform(&self) -> Option<&dyn PlatformPlugin> {
        self.exposes
            .contains(Capability::Platform)
            .then_some(self as &dyn PlatformPlugin)
    }

    fn as_analysis(&self) -> Option<&dyn AnalysisPlugin> {
        self.exposes
            .contains(Capability::Analysis)
            .then_some(self as &dyn AnalysisPlugin)
    }

    fn as_synthesis(&self) -> Option<&dyn SynthesisPlugin> {
        self.exposes
            .contains(Capability::Synthesis)
            .then_some(self as &dyn SynthesisPlugin)
    }

    fn as_post_processing(&self) -> Option<&dyn PostProcessingPlugin> {
        self.exposes
            .contains(Capability::PostProcessing)
            .then_some(self as &dyn PostProcessingPlugin)
    }
}

#[async_trait]
impl PlatformPlugin for MockPlugin {
    fn supports(&self, url: &str) -> bool {
        self.hosts.iter().any(|host| url.contains(host.as_str()))
    }

    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<RepositoryDescriptor>, RepokitError> {
        let limit = options.limit.unwrap_or(1);
        Ok((0..limit)
            .map(|n| RepositoryDescriptor {
                name: format!("{query}-{n}"),
                url: format!("https://{}/{query}-{n}", self.hosts.first().map_or("mock.test", String::as_str)),
                description: None,
                stars: Some(n as u64),
                language: options.language.clone(),
            })
            .collect())
    }

    async fn analyze(&self, repo_url: &str) -> Result<RepositoryAnalysis, RepokitError> {
        let mut analysis = RepositoryAnalysis::new();
        analysis.insert("plugin".to_string(), json!(self.id));
        analysis.insert("url".to_string(), json!(repo_url));
        Ok(analysis)
    }
}

#[async_trait]
impl AnalysisPlugin for MockPlugin {
    async fn analyze(&self, _project_path: &Path) -> Result<AnalysisReport, RepokitError> {
        Ok(AnalysisReport {
            vulnerabilities: Vec::new(),
            score: Score::saturating(Score::MAX),
            recommendations: Vec::new(),
        })
    }
}

#[async_trait]
impl SynthesisPlugin for MockPlugin {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<GeneratedProject, RepokitError> {
        Ok(GeneratedProject {
            name: request.name.clone(),
            files: vec![GeneratedFile {
                path: "README.md".into(),
                contents: format!("# {}\n", request.name),
            }],
            metadata: Settings::from([("generator".to_string(), json!(self.id))]),
        })
    }
}

#[async_trait]
impl PostProcessingPlugin for MockPlugin {
    async fn process(&self, mut artifact: Artifact) -> Result<Artifact, RepokitError> {
        artifact
            .metadata
            .insert("processed_by".to_string(), json!(self.id));
        Ok(artifact)
    }
}
