// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base plugin trait, load context and factory contract.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RepokitError;
use crate::traits::{AnalysisPlugin, PlatformPlugin, PostProcessingPlugin, SynthesisPlugin};
use crate::types::{Capability, CapabilitySet, Settings};

/// Context handed to a plugin's load hook.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginContext {
    /// Id the plugin is registered under.
    pub id: String,
    /// Effective settings scoped to this plugin.
    pub settings: Settings,
}

/// The base trait for all Repokit plugins.
///
/// Lifecycle hooks may perform blocking I/O. Anything acquired in
/// [`on_load`](Plugin::on_load) must be released by
/// [`on_unload`](Plugin::on_unload). If `on_load` returns an error or panics,
/// `on_unload` is called once right after, so it must tolerate a partial
/// load. A load hook that times out gets no cleanup call.
#[async_trait]
pub trait Plugin: Send + Sync + 'static {
    /// Called once after construction, before the plugin becomes active.
    async fn on_load(&self, _ctx: &PluginContext) -> Result<(), RepokitError> {
        Ok(())
    }

    /// Called at most once per load attempt: after a successful load when the
    /// plugin is unloaded, or right after a load hook that failed.
    async fn on_unload(&self) -> Result<(), RepokitError> {
        Ok(())
    }

    fn as_platform(&self) -> Option<&dyn PlatformPlugin> {
        None
    }

    fn as_analysis(&self) -> Option<&dyn AnalysisPlugin> {
        None
    }

    fn as_synthesis(&self) -> Option<&dyn SynthesisPlugin> {
        None
    }

    fn as_post_processing(&self) -> Option<&dyn PostProcessingPlugin> {
        None
    }

    /// Whether this instance exposes the operations of `capability`.
    fn implements(&self, capability: Capability) -> bool {
        match capability {
            Capability::Platform => self.as_platform().is_some(),
            Capability::Analysis => self.as_analysis().is_some(),
            Capability::Synthesis => self.as_synthesis().is_some(),
            Capability::PostProcessing => self.as_post_processing().is_some(),
        }
    }

    /// The subset of `declared` this instance actually implements.
    fn verified_capabilities(&self, declared: &CapabilitySet) -> CapabilitySet {
        declared.iter().filter(|c| self.implements(*c)).collect()
    }
}

/// Constructs plugin instances from their effective settings.
pub trait PluginFactory: Send + Sync + 'static {
    fn create(&self, settings: &Settings) -> Result<Arc<dyn Plugin>, RepokitError>;
}

impl<F> PluginFactory for F
where
    F: Fn(&Settings) -> Result<Arc<dyn Plugin>, RepokitError> + Send + Sync + 'static,
{
    fn create(&self, settings: &Settings) -> Result<Arc<dyn Plugin>, RepokitError> {
        self(settings)
    }
}
