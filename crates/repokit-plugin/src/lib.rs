// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin discovery, validation, dependency resolution and lifecycle.
//!
//! Plugins are found in three tiers (builtin, user, project-local), the
//! most specific tier wins per id, and the [`PluginRegistry`] drives each
//! winner through validation, dependency ordering, configuration-based
//! activation and its load/unload hooks.

pub mod activation;
pub mod discovery;
pub mod events;
pub mod lifecycle;
pub mod manifest;
pub mod registry;
pub mod resolver;
pub mod validate;

pub use activation::{Activation, ConfigResolver};
pub use discovery::directory::MANIFEST_FILE;
pub use discovery::{
    Candidate, Constructor, DirectorySource, DiscoveryReport, DiscoveryScanner, FactoryTable,
    PluginSource, StaticSource, directory_sources, resolve_precedence,
};
pub use events::{EVENT_CHANNEL_CAPACITY, LifecycleEvent};
pub use lifecycle::{LifecycleManager, LoadedPlugin};
pub use manifest::{PluginManifest, parse_plugin_manifest};
pub use registry::{PluginRecord, PluginRegistry, PluginSummary, RecordError, RegistrySummary};
pub use resolver::{Resolution, resolve};
pub use validate::{metadata_problems, validate_metadata};
