// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin trait definitions for the Repokit capability contracts.
//!
//! Every plugin implements the [`Plugin`] base trait; capability traits
//! extend it and are exposed through the base trait's `as_*` accessors.

pub mod analysis;
pub mod platform;
pub mod plugin;
pub mod post_processing;
pub mod synthesis;

pub use analysis::AnalysisPlugin;
pub use platform::PlatformPlugin;
pub use plugin::{Plugin, PluginContext, PluginFactory};
pub use post_processing::PostProcessingPlugin;
pub use synthesis::SynthesisPlugin;
