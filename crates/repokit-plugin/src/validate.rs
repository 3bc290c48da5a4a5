// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metadata validation for discovered candidates.
//!
//! Pure checks on a candidate's declared identity. Whether `requires`
//! entries exist is left to dependency resolution, since a dependency may
//! come from a later tier.

use repokit_core::{CapabilitySet, PluginMetadata, RepokitError, is_valid_plugin_id};

/// Every problem with `metadata` and `capabilities`, in declaration order.
pub fn metadata_problems(metadata: &PluginMetadata, capabilities: &CapabilitySet) -> Vec<String> {
    let mut problems = Vec::new();

    if metadata.id.is_empty() {
        problems.push("id must not be empty".to_string());
    } else if !is_valid_plugin_id(&metadata.id) {
        problems.push(format!(
            "id `{}` must match [a-z0-9][a-z0-9-]*",
            metadata.id
        ));
    }

    if metadata.name.trim().is_empty() {
        problems.push("name must not be empty".to_string());
    }

    if metadata.description.trim().is_empty() {
        problems.push("description must not be empty".to_string());
    }

    if let Err(e) = semver::Version::parse(&metadata.version) {
        problems.push(format!(
            "version `{}` is not a semantic version: {e}",
            metadata.version
        ));
    }

    for dependency in metadata.requires.iter().filter(|d| !is_valid_plugin_id(d)) {
        problems.push(format!("requires entry `{dependency}` is not a valid plugin id"));
    }

    if capabilities.is_empty() {
        problems.push("at least one capability must be declared".to_string());
    }

    problems
}

/// Validate a candidate's declaration, collecting all problems into one error.
pub fn validate_metadata(
    metadata: &PluginMetadata,
    capabilities: &CapabilitySet,
) -> Result<(), RepokitError> {
    let problems = metadata_problems(metadata, capabilities);
    if problems.is_empty() {
        Ok(())
    } else {
        Err(RepokitError::Validation {
            id: metadata.id.clone(),
            problems,
        })
    }
}
