// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Repokit plugin host.
//!
//! This crate provides the error taxonomy, shared types and the plugin
//! capability traits used throughout the Repokit workspace. Every plugin
//! implements [`Plugin`] and exposes its capabilities through it.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{DependencyFailure, RepokitError};
pub use types::{
    Capability, CapabilitySet, Hook, PluginMetadata, PluginState, PluginStatus, Settings, Tier,
    is_valid_plugin_id,
};

pub use traits::{
    AnalysisPlugin, PlatformPlugin, Plugin, PluginContext, PluginFactory, PostProcessingPlugin,
    SynthesisPlugin,
};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::types::Artifact;

    struct Upper;

    #[async_trait]
    impl Plugin for Upper {
        fn as_post_processing(&self) -> Option<&dyn PostProcessingPlugin> {
            Some(self)
        }
    }

    #[async_trait]
    impl PostProcessingPlugin for Upper {
        async fn process(&self, mut artifact: Artifact) -> Result<Artifact, RepokitError> {
            artifact.content.make_ascii_uppercase();
            Ok(artifact)
        }
    }

    #[test]
    fn error_kinds_are_stable() {
        let dep = RepokitError::Dependency {
            id: "foo".into(),
            failure: DependencyFailure::Missing {
                dependency: "missing-dep".into(),
            },
        };
        assert_eq!(dep.kind(), "dependency");
        assert!(dep.to_string().contains("missing-dep"));

        let timeout = RepokitError::HookTimeout {
            id: "bar".into(),
            hook: Hook::Load,
            timeout: std::time::Duration::from_millis(50),
        };
        assert_eq!(timeout.kind(), "timeout");
        assert!(timeout.to_string().contains("load hook"));

        let not_found = RepokitError::NotFound { id: "x".into() };
        assert_eq!(not_found.to_string(), "plugin not found: x");
    }

    #[test]
    fn cycle_failure_lists_members() {
        let failure = DependencyFailure::Cycle {
            members: vec!["a".into(), "b".into()],
        };
        assert_eq!(failure.to_string(), "dependency cycle: a -> b");
    }

    #[test]
    fn capability_accessors_drive_verification() {
        let plugin = Upper;
        let declared = CapabilitySet::new()
            .with(Capability::PostProcessing)
            .with(Capability::Platform);
        let verified = plugin.verified_capabilities(&declared);
        assert!(verified.contains(Capability::PostProcessing));
        assert!(!verified.contains(Capability::Platform));
        assert!(plugin.as_analysis().is_none());
    }

    #[test]
    fn closures_are_factories() {
        let factory = |_: &Settings| -> Result<Arc<dyn Plugin>, RepokitError> { Ok(Arc::new(Upper)) };
        let boxed: Box<dyn PluginFactory> = Box::new(factory);
        let instance = boxed.create(&Settings::new()).unwrap();
        assert!(instance.implements(Capability::PostProcessing));
    }

    #[tokio::test]
    async fn default_hooks_succeed() {
        let plugin: Arc<dyn Plugin> = Arc::new(Upper);
        let ctx = PluginContext {
            id: "upper".into(),
            settings: Settings::new(),
        };
        plugin.on_load(&ctx).await.unwrap();
        plugin.on_unload().await.unwrap();

        let out = plugin
            .as_post_processing()
            .unwrap()
            .process(Artifact::text("a.md", "text/markdown", "hi"))
            .await
            .unwrap();
        assert_eq!(out.content, b"HI");
    }
}
