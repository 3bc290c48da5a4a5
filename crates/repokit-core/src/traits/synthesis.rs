// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synthesis plugin trait.

use async_trait::async_trait;

use crate::error::RepokitError;
use crate::traits::plugin::Plugin;
use crate::types::{GeneratedProject, SynthesisRequest};

/// Generates a project from a synthesis request.
#[async_trait]
pub trait SynthesisPlugin: Plugin {
    async fn synthesize(&self, request: &SynthesisRequest)
    -> Result<GeneratedProject, RepokitError>;
}
