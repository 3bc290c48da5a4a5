// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `repokit analyze`: run every enabled analysis plugin over a project.

use std::path::Path;

use repokit_core::types::AnalysisReport;
use repokit_core::{Capability, RepokitError};
use repokit_plugin::PluginRegistry;
use serde::Serialize;
use tracing::warn;

/// One plugin's outcome.
#[derive(Debug, Serialize)]
pub struct PluginReport {
    pub plugin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<AnalysisReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Analyze `path` with each enabled analysis plugin, in load order. A failing
/// plugin is reported alongside the others instead of aborting the run.
pub async fn collect_reports(registry: &PluginRegistry, path: &Path) -> Vec<PluginReport> {
    let mut reports = Vec::new();
    for (id, plugin) in registry.with_capability(Capability::Analysis) {
        let Some(analysis) = plugin.as_analysis() else {
            continue;
        };
        let outcome = analysis.analyze(path).await;
        reports.push(match outcome {
            Ok(report) => PluginReport {
                plugin: id,
                report: Some(report),
                error: None,
            },
            Err(e) => {
                warn!(plugin = %id, error = %e, "analysis failed");
                PluginReport {
                    plugin: id,
                    report: None,
                    error: Some(e.to_string()),
                }
            }
        });
    }
    reports
}

/// Run `repokit analyze`.
pub async fn run_analyze(
    registry: &PluginRegistry,
    path: &Path,
    json: bool,
) -> Result<(), RepokitError> {
    let reports = collect_reports(registry, path).await;
    if reports.is_empty() {
        return Err(RepokitError::Internal(
            "no enabled analysis plugins".to_string(),
        ));
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).unwrap_or_else(|_| "[]".to_string())
        );
        return Ok(());
    }

    println!();
    println!("  repokit analyze {}", path.display());
    println!("  {}", "-".repeat(35));
    for entry in &reports {
        match (&entry.report, &entry.error) {
            (Some(report), _) => {
                println!("    {}: score {:.0}", entry.plugin, report.score.value());
                for vuln in &report.vulnerabilities {
                    println!("      [{}] {}: {}", vuln.severity, vuln.id, vuln.summary);
                }
                for advice in &report.recommendations {
                    println!("      - {advice}");
                }
            }
            (None, Some(error)) => println!("    {}: error: {error}", entry.plugin),
            (None, None) => {}
        }
    }
    println!();
    Ok(())
}
