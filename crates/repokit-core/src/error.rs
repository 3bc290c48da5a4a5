// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Repokit plugin host.

use std::time::Duration;

use thiserror::Error;

use crate::types::Hook;

/// Why a plugin's `requires` list could not be satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyFailure {
    /// A required id has no registration at all.
    Missing { dependency: String },
    /// A required id is registered but not enabled.
    Inactive { dependency: String },
    /// The plugin participates in a `requires` cycle.
    Cycle { members: Vec<String> },
}

impl std::fmt::Display for DependencyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DependencyFailure::Missing { dependency } => {
                write!(f, "missing dependency `{dependency}`")
            }
            DependencyFailure::Inactive { dependency } => {
                write!(f, "dependency `{dependency}` is not enabled")
            }
            DependencyFailure::Cycle { members } => {
                write!(f, "dependency cycle: {}", members.join(" -> "))
            }
        }
    }
}

/// The primary error type used across the plugin core and capability traits.
#[derive(Debug, Error)]
pub enum RepokitError {
    /// A discovery location could not be read. Logged and skipped.
    #[error("discovery error at {location}: {source}")]
    Discovery {
        location: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A candidate's declared metadata is malformed.
    #[error("invalid metadata for plugin `{id}`: {}", problems.join("; "))]
    Validation { id: String, problems: Vec<String> },

    /// A plugin's `requires` graph cannot be satisfied.
    #[error("plugin `{id}`: {failure}")]
    Dependency {
        id: String,
        failure: DependencyFailure,
    },

    /// A declared capability is not exposed by the constructed instance.
    #[error("plugin `{id}` declares {} but does not implement it", missing.join(", "))]
    Capability { id: String, missing: Vec<String> },

    /// Construction or a lifecycle hook failed.
    #[error("plugin `{id}` failed to load: {message}")]
    Load { id: String, message: String },

    /// A lifecycle hook did not finish within its budget.
    #[error("plugin `{id}` {hook} hook timed out after {timeout:?}")]
    HookTimeout {
        id: String,
        hook: Hook,
        timeout: Duration,
    },

    /// The referenced plugin id is not registered.
    #[error("plugin not found: {id}")]
    NotFound { id: String },

    /// The configuration forbids enabling this plugin.
    #[error("plugin `{id}` cannot be enabled: {reason}")]
    ActivationDenied { id: String, reason: String },

    /// A capability operation failed inside a plugin.
    #[error("plugin `{plugin}` operation failed: {message}")]
    Operation {
        plugin: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RepokitError {
    /// Stable short label for log fields and status output.
    pub fn kind(&self) -> &'static str {
        match self {
            RepokitError::Discovery { .. } => "discovery",
            RepokitError::Validation { .. } => "validation",
            RepokitError::Dependency { .. } => "dependency",
            RepokitError::Capability { .. } => "capability",
            RepokitError::Load { .. } => "load",
            RepokitError::HookTimeout { .. } => "timeout",
            RepokitError::NotFound { .. } => "not-found",
            RepokitError::ActivationDenied { .. } => "activation-denied",
            RepokitError::Operation { .. } => "operation",
            RepokitError::Config(_) => "config",
            RepokitError::Internal(_) => "internal",
        }
    }

    /// Shorthand for a failed capability operation without an underlying source.
    pub fn operation(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        RepokitError::Operation {
            plugin: plugin.into(),
            message: message.into(),
            source: None,
        }
    }
}
