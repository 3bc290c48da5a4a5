// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the plugin core, the capability traits and the
//! status surface.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::RepokitError;

static PLUGIN_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]*$").expect("static regex is valid"));

/// Returns true when `id` matches `[a-z0-9][a-z0-9-]*`.
pub fn is_valid_plugin_id(id: &str) -> bool {
    PLUGIN_ID_RE.is_match(id)
}

/// Per-plugin settings, keyed by setting name.
pub type Settings = BTreeMap<String, serde_json::Value>;

/// Discovery location a candidate came from, in ascending precedence.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Builtin,
    User,
    ProjectLocal,
}

/// A role a plugin can fulfil.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Platform,
    Analysis,
    Synthesis,
    PostProcessing,
}

/// Set of capabilities declared by (or verified on) a plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(std::collections::BTreeSet<Capability>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.0.insert(capability);
        self
    }

    pub fn insert(&mut self, capability: Capability) -> bool {
        self.0.insert(capability)
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", names.join(","))
    }
}

/// Lifecycle hook kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Hook {
    Load,
    Unload,
}

/// Lifecycle state of a registered plugin.
///
/// `Discovered -> Validated -> Loaded -> Enabled <-> Disabled -> Unloaded`,
/// with `Failed` reachable from `Validated`, `Loaded` and `Enabled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum PluginState {
    Discovered,
    Validated,
    Loaded,
    Enabled,
    Disabled,
    Unloaded,
    Failed,
}

impl PluginState {
    /// Whether the state machine permits moving from `self` to `next`.
    ///
    /// `Validated -> Disabled` covers candidates held back by configuration
    /// or unmet dependencies before any hook ran, and `Disabled -> Loaded`
    /// is the deferred load of such a candidate.
    pub fn can_transition_to(self, next: PluginState) -> bool {
        use PluginState::*;
        matches!(
            (self, next),
            (Discovered, Validated)
                | (Discovered, Failed)
                | (Validated, Loaded)
                | (Validated, Disabled)
                | (Validated, Failed)
                | (Loaded, Enabled)
                | (Loaded, Disabled)
                | (Loaded, Unloaded)
                | (Loaded, Failed)
                | (Enabled, Disabled)
                | (Enabled, Unloaded)
                | (Enabled, Failed)
                | (Disabled, Enabled)
                | (Disabled, Loaded)
                | (Disabled, Unloaded)
                | (Disabled, Failed)
        )
    }

    /// Coarse status as rendered by an external status endpoint.
    pub fn status(self) -> PluginStatus {
        match self {
            PluginState::Enabled => PluginStatus::Active,
            PluginState::Failed => PluginStatus::Failed,
            _ => PluginStatus::Disabled,
        }
    }
}

/// Status reported on the external status surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PluginStatus {
    Active,
    Disabled,
    Failed,
}

/// Declared identity of a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    /// Unique id, pattern `[a-z0-9][a-z0-9-]*`.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Semantic version string.
    pub version: String,
    /// Short description.
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    /// Ids this plugin needs active before it can load.
    #[serde(default)]
    pub requires: Vec<String>,
}

impl PluginMetadata {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            description: description.into(),
            author: None,
            homepage: None,
            requires: Vec::new(),
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_homepage(mut self, homepage: impl Into<String>) -> Self {
        self.homepage = Some(homepage.into());
        self
    }

    pub fn with_requires<I, S>(mut self, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires = requires.into_iter().map(Into::into).collect();
        self
    }
}

// --- Platform payloads ---

/// Options for a platform repository search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Maximum number of results; `None` leaves it to the platform.
    pub limit: Option<usize>,
    /// Restrict results to a primary language.
    pub language: Option<String>,
    /// Sort key understood by the platform (e.g. "stars").
    pub sort: Option<String>,
}

/// A repository as returned by a platform search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stars: Option<u64>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Free-form analysis result returned by a platform.
pub type RepositoryAnalysis = serde_json::Map<String, serde_json::Value>;

// --- Analysis payloads ---

/// Severity of a reported vulnerability.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// A single finding produced by an analysis plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: String,
    pub severity: Severity,
    pub summary: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Project score in the closed range `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Score(f64);

impl Score {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    /// Rejects values outside `[0, 100]` and NaN.
    pub fn new(value: f64) -> Result<Self, RepokitError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RepokitError::Internal(format!(
                "score {value} is outside [0, 100]"
            )))
        }
    }

    /// Clamps into `[0, 100]`; NaN becomes 0.
    pub fn saturating(value: f64) -> Self {
        if value.is_nan() {
            Self(Self::MIN)
        } else {
            Self(value.clamp(Self::MIN, Self::MAX))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Score::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Result of analysing a local project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub vulnerabilities: Vec<Vulnerability>,
    pub score: Score,
    pub recommendations: Vec<String>,
}

// --- Synthesis payloads ---

/// Input for project synthesis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub name: String,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub options: Settings,
}

/// One generated file, path relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Descriptor of a synthesized project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedProject {
    pub name: String,
    pub files: Vec<GeneratedFile>,
    #[serde(default)]
    pub metadata: Settings,
}

// --- Post-processing payloads ---

/// An artifact passed through post-processing plugins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    /// Media type or short kind label, e.g. "text/markdown".
    pub kind: String,
    pub content: Vec<u8>,
    #[serde(default)]
    pub metadata: Settings,
}

impl Artifact {
    pub fn text(name: impl Into<String>, kind: impl Into<String>, content: &str) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            content: content.as_bytes().to_vec(),
            metadata: Settings::new(),
        }
    }
}
