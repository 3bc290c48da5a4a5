// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugins compiled into the `repokit` binary.
//!
//! They are registered at the Builtin tier, and their factories are also
//! available to `plugin.toml` manifests in the user and project directories,
//! so a project can pin a version or carry its own settings for them.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use repokit_core::types::{AnalysisReport, Artifact, Score, Severity, Vulnerability};
use repokit_core::{
    AnalysisPlugin, Capability, CapabilitySet, Plugin, PluginContext, PluginFactory,
    PluginMetadata, PostProcessingPlugin, RepokitError, Settings, Tier,
};
use repokit_plugin::{FactoryTable, StaticSource};
use serde_json::{Value, json};
use tracing::debug;

pub const LICENSE_CHECK: &str = "license-check";
pub const TEXT_NORMALIZE: &str = "text-normalize";

/// Builtin-tier source with every compiled-in plugin.
pub fn builtin_source() -> StaticSource {
    StaticSource::new(Tier::Builtin, "builtin")
        .with(
            PluginMetadata::new(
                LICENSE_CHECK,
                "License check",
                env!("CARGO_PKG_VERSION"),
                "Scores a project on license, readme, changelog and tests",
            )
            .with_author("Repokit Contributors"),
            CapabilitySet::new().with(Capability::Analysis),
            license_check_factory(),
        )
        .with(
            PluginMetadata::new(
                TEXT_NORMALIZE,
                "Text normalize",
                env!("CARGO_PKG_VERSION"),
                "Normalizes line endings and trailing whitespace in text artifacts",
            )
            .with_author("Repokit Contributors"),
            CapabilitySet::new().with(Capability::PostProcessing),
            text_normalize_factory(),
        )
}

/// Factories that manifests may name.
pub fn factory_table() -> FactoryTable {
    FactoryTable::new()
        .with(LICENSE_CHECK, license_check_factory())
        .with(TEXT_NORMALIZE, text_normalize_factory())
}

fn license_check_factory() -> Arc<dyn PluginFactory> {
    Arc::new(|_: &Settings| -> Result<Arc<dyn Plugin>, RepokitError> { Ok(Arc::new(LicenseCheck)) })
}

fn text_normalize_factory() -> Arc<dyn PluginFactory> {
    Arc::new(|settings: &Settings| -> Result<Arc<dyn Plugin>, RepokitError> {
        Ok(Arc::new(TextNormalize::from_settings(settings)?))
    })
}

// --- license-check ---

const LICENSE_FILES: &[&str] = &["LICENSE", "LICENSE.md", "LICENSE-MIT", "LICENSE-APACHE", "COPYING"];
const README_FILES: &[&str] = &["README.md", "README", "README.rst"];
const CHANGELOG_FILES: &[&str] = &["CHANGELOG.md", "CHANGELOG", "HISTORY.md"];
const TEST_DIRS: &[&str] = &["tests", "test"];

/// Checks for the files every published project should carry.
#[derive(Debug)]
struct LicenseCheck;

async fn any_exists(root: &Path, names: &[&str]) -> bool {
    for name in names {
        if tokio::fs::try_exists(root.join(name)).await.unwrap_or(false) {
            return true;
        }
    }
    false
}

#[async_trait]
impl Plugin for LicenseCheck {
    fn as_analysis(&self) -> Option<&dyn AnalysisPlugin> {
        Some(self)
    }
}

#[async_trait]
impl AnalysisPlugin for LicenseCheck {
    async fn analyze(&self, project_path: &Path) -> Result<AnalysisReport, RepokitError> {
        let meta = tokio::fs::metadata(project_path).await.map_err(|e| RepokitError::Operation {
            plugin: LICENSE_CHECK.to_string(),
            message: format!("cannot read {}", project_path.display()),
            source: Some(Box::new(e)),
        })?;
        if !meta.is_dir() {
            return Err(RepokitError::operation(
                LICENSE_CHECK,
                format!("{} is not a directory", project_path.display()),
            ));
        }

        let checks = [
            ("license", LICENSE_FILES, "Add a LICENSE file"),
            ("readme", README_FILES, "Add a README describing the project"),
            ("changelog", CHANGELOG_FILES, "Keep a CHANGELOG"),
            ("tests", TEST_DIRS, "Add a tests directory"),
        ];
        let per_check = Score::MAX / checks.len() as f64;

        let mut score = 0.0;
        let mut recommendations = Vec::new();
        let mut vulnerabilities = Vec::new();
        for (label, names, advice) in checks {
            if any_exists(project_path, names).await {
                score += per_check;
            } else {
                debug!(check = label, path = %project_path.display(), "check not satisfied");
                recommendations.push(advice.to_string());
                if label == "license" {
                    vulnerabilities.push(Vulnerability {
                        id: "missing-license".to_string(),
                        severity: Severity::Medium,
                        summary: "No license file; the project cannot be safely reused".to_string(),
                        location: Some(project_path.display().to_string()),
                    });
                }
            }
        }

        Ok(AnalysisReport {
            vulnerabilities,
            score: Score::saturating(score),
            recommendations,
        })
    }
}

// --- text-normalize ---

/// Rewrites text artifacts to LF line endings, optionally trimming
/// trailing whitespace, and guarantees one final newline.
#[derive(Debug)]
struct TextNormalize {
    trim_trailing_whitespace: bool,
}

impl TextNormalize {
    fn from_settings(settings: &Settings) -> Result<Self, RepokitError> {
        let trim_trailing_whitespace = match settings.get("trim_trailing_whitespace") {
            None => true,
            Some(Value::Bool(flag)) => *flag,
            Some(other) => {
                return Err(RepokitError::Config(format!(
                    "{TEXT_NORMALIZE}: trim_trailing_whitespace must be a boolean, got {other}"
                )));
            }
        };
        Ok(Self {
            trim_trailing_whitespace,
        })
    }

    fn normalize(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 1);
        for line in text.lines() {
            if self.trim_trailing_whitespace {
                out.push_str(line.trim_end());
            } else {
                out.push_str(line);
            }
            out.push('\n');
        }
        out
    }
}

#[async_trait]
impl Plugin for TextNormalize {
    async fn on_load(&self, ctx: &PluginContext) -> Result<(), RepokitError> {
        debug!(plugin = %ctx.id, trim = self.trim_trailing_whitespace, "text normalizer ready");
        Ok(())
    }

    fn as_post_processing(&self) -> Option<&dyn PostProcessingPlugin> {
        Some(self)
    }
}

#[async_trait]
impl PostProcessingPlugin for TextNormalize {
    async fn process(&self, mut artifact: Artifact) -> Result<Artifact, RepokitError> {
        let text = String::from_utf8(artifact.content).map_err(|e| RepokitError::Operation {
            plugin: TEXT_NORMALIZE.to_string(),
            message: format!("artifact `{}` is not UTF-8 text", artifact.name),
            source: Some(Box::new(e)),
        })?;
        artifact.content = self.normalize(&text).into_bytes();
        artifact
            .metadata
            .insert("normalized_by".to_string(), json!(TEXT_NORMALIZE));
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_line_endings_and_whitespace() {
        let plugin = TextNormalize::from_settings(&Settings::new()).unwrap();
        assert_eq!(plugin.normalize("a  \r\nb\t\r\nc"), "a\nb\nc\n");
    }

    #[test]
    fn trimming_can_be_turned_off() {
        let settings = Settings::from([("trim_trailing_whitespace".to_string(), json!(false))]);
        let plugin = TextNormalize::from_settings(&settings).unwrap();
        assert_eq!(plugin.normalize("a  \r\nb"), "a  \nb\n");
    }

    #[test]
    fn rejects_non_boolean_setting() {
        let settings = Settings::from([("trim_trailing_whitespace".to_string(), json!("yes"))]);
        let err = TextNormalize::from_settings(&settings).unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[tokio::test]
    async fn non_utf8_artifact_is_an_operation_error() {
        let plugin = TextNormalize::from_settings(&Settings::new()).unwrap();
        let artifact = Artifact {
            name: "blob".into(),
            kind: "application/octet-stream".into(),
            content: vec![0xff, 0xfe],
            metadata: Settings::new(),
        };
        let err = plugin.process(artifact).await.unwrap_err();
        assert_eq!(err.kind(), "operation");
    }

    #[tokio::test]
    async fn scores_project_layout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("LICENSE"), "MIT").unwrap();
        std::fs::write(dir.path().join("README.md"), "# demo").unwrap();

        let report = LicenseCheck.analyze(dir.path()).await.unwrap();
        assert_eq!(report.score.value(), 50.0);
        assert_eq!(report.recommendations.len(), 2);
        assert!(report.vulnerabilities.is_empty());

        std::fs::remove_file(dir.path().join("LICENSE")).unwrap();
        let report = LicenseCheck.analyze(dir.path()).await.unwrap();
        assert_eq!(report.vulnerabilities[0].id, "missing-license");
    }

    #[tokio::test]
    async fn missing_project_is_an_error() {
        let err = LicenseCheck
            .analyze(Path::new("/definitely/not/here"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "operation");
    }

    #[test]
    fn builtin_source_and_factory_table_agree() {
        assert_eq!(builtin_source().len(), 2);
        let table = factory_table();
        assert!(table.get(LICENSE_CHECK).is_some());
        assert!(table.get(TEXT_NORMALIZE).is_some());
    }
}
