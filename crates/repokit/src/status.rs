// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `repokit list`, `repokit info` and `repokit check`.
//!
//! `--json` prints the status surface as structured JSON for scripting.
//! `--plain`, or a non-TTY stdout, disables colors.

use std::io::IsTerminal;

use repokit_core::{PluginStatus, RepokitError};
use repokit_plugin::{PluginRecord, PluginRegistry, PluginSummary, RegistrySummary};
use serde::Serialize;

/// Structured output for `repokit list --json`.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub plugins: Vec<PluginSummary>,
    pub summary: RegistrySummary,
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn use_color(plain: bool) -> bool {
    !plain && std::io::stdout().is_terminal()
}

fn status_label(status: PluginStatus, use_color: bool) -> String {
    if !use_color {
        return status.to_string();
    }
    use colored::Colorize;
    match status {
        PluginStatus::Active => status.to_string().green().to_string(),
        PluginStatus::Disabled => status.to_string().yellow().to_string(),
        PluginStatus::Failed => status.to_string().red().to_string(),
    }
}

/// Run `repokit list`.
pub fn run_list(registry: &PluginRegistry, json: bool, plain: bool) {
    let plugins = registry.list();
    if json {
        println!(
            "{}",
            to_json(&ListResponse {
                plugins,
                summary: registry.summary(),
            })
        );
        return;
    }
    print!("{}", render_table(&plugins, use_color(plain)));
}

fn render_table(plugins: &[PluginSummary], use_color: bool) -> String {
    if plugins.is_empty() {
        return "  no plugins discovered\n".to_string();
    }
    let id_w = plugins.iter().map(|p| p.id.len()).max().unwrap_or(0).max(2);
    let name_w = plugins.iter().map(|p| p.name.len()).max().unwrap_or(0).max(4);
    let version_w = plugins.iter().map(|p| p.version.len()).max().unwrap_or(0).max(7);

    let mut out = String::new();
    out.push_str(&format!(
        "  {:<id_w$}  {:<name_w$}  {:<version_w$}  {:<7}  STATUS\n",
        "ID", "NAME", "VERSION", "ENABLED"
    ));
    for plugin in plugins {
        out.push_str(&format!(
            "  {:<id_w$}  {:<name_w$}  {:<version_w$}  {:<7}  {}\n",
            plugin.id,
            plugin.name,
            plugin.version,
            if plugin.enabled { "yes" } else { "no" },
            status_label(plugin.status, use_color)
        ));
    }
    out
}

/// Run `repokit info <id>`.
pub fn run_info(registry: &PluginRegistry, id: &str, json: bool) -> Result<(), RepokitError> {
    let record = registry.get(id)?;
    if json {
        println!("{}", to_json(&record));
    } else {
        print!("{}", render_record(&record));
    }
    Ok(())
}

fn render_record(record: &PluginRecord) -> String {
    let meta = &record.metadata;
    let mut out = String::new();
    out.push_str(&format!("\n  {} ({})\n", meta.name, meta.id));
    out.push_str(&format!("  {}\n", "-".repeat(35)));
    out.push_str(&format!("    Version:      {}\n", meta.version));
    out.push_str(&format!("    Description:  {}\n", meta.description));
    if let Some(author) = &meta.author {
        out.push_str(&format!("    Author:       {author}\n"));
    }
    if let Some(homepage) = &meta.homepage {
        out.push_str(&format!("    Homepage:     {homepage}\n"));
    }
    out.push_str(&format!("    Tier:         {}\n", record.tier));
    out.push_str(&format!("    Origin:       {}\n", record.origin));
    out.push_str(&format!("    State:        {} ({})\n", record.state, record.status()));
    out.push_str(&format!("    Capabilities: {}\n", record.capabilities));
    if !meta.requires.is_empty() {
        out.push_str(&format!("    Requires:     {}\n", meta.requires.join(", ")));
    }
    if !record.settings.is_empty() {
        // Keys only; values may hold secrets.
        let keys: Vec<&str> = record.settings.keys().map(String::as_str).collect();
        out.push_str(&format!("    Settings:     {}\n", keys.join(", ")));
    }
    if let Some(error) = &record.last_error {
        out.push_str(&format!("    Last error:   {error}\n"));
    }
    out.push('\n');
    out
}

/// Run `repokit check`. Returns `true` when no plugin failed.
pub fn run_check(registry: &PluginRegistry, plain: bool) -> bool {
    let summary = registry.summary();
    let color = use_color(plain);
    let failed: Vec<PluginRecord> = registry
        .list()
        .iter()
        .filter(|p| p.status == PluginStatus::Failed)
        .filter_map(|p| registry.get(&p.id).ok())
        .collect();

    println!(
        "  {} plugins: {} active, {} disabled, {} failed",
        summary.total, summary.active, summary.disabled, summary.failed
    );
    for record in &failed {
        let reason = record
            .last_error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        if color {
            use colored::Colorize;
            println!("    {} {}: {reason}", "✗".red(), record.id());
        } else {
            println!("    [FAIL] {}: {reason}", record.id());
        }
    }
    failed.is_empty()
}
