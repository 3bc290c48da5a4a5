// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform plugin trait for repository hosting integrations (GitHub, GitLab, etc.).

use async_trait::async_trait;

use crate::error::RepokitError;
use crate::traits::plugin::Plugin;
use crate::types::{RepositoryAnalysis, RepositoryDescriptor, SearchOptions};

/// Discovers and inspects repositories on a hosting platform.
#[async_trait]
pub trait PlatformPlugin: Plugin {
    /// Whether this platform handles `url`. Must not perform I/O.
    fn supports(&self, url: &str) -> bool;

    /// Searches the platform for repositories matching `query`.
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<RepositoryDescriptor>, RepokitError>;

    /// Analyzes a remote repository.
    async fn analyze(&self, repo_url: &str) -> Result<RepositoryAnalysis, RepokitError>;
}
