// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-processing plugin trait.

use async_trait::async_trait;

use crate::error::RepokitError;
use crate::traits::plugin::Plugin;
use crate::types::Artifact;

/// Transforms an artifact produced earlier in the pipeline.
#[async_trait]
pub trait PostProcessingPlugin: Plugin {
    async fn process(&self, artifact: Artifact) -> Result<Artifact, RepokitError>;
}
