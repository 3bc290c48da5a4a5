// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analysis plugin trait for local project inspection.

use std::path::Path;

use async_trait::async_trait;

use crate::error::RepokitError;
use crate::traits::plugin::Plugin;
use crate::types::AnalysisReport;

/// Inspects a project on disk and reports findings with a score.
#[async_trait]
pub trait AnalysisPlugin: Plugin {
    async fn analyze(&self, project_path: &Path) -> Result<AnalysisReport, RepokitError>;
}
