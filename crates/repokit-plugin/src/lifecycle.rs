// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin construction and lifecycle hook execution.
//!
//! Each hook runs on its own task, bounded by a uniform timeout. A hook that
//! overruns is abandoned: the task is detached, not cancelled, so any work it
//! still has in flight keeps running. A panicking hook is reported as a load
//! failure instead of unwinding into the registry.
//!
//! A load hook that returns an error or panics gets one unload call right
//! away, so the plugin can release whatever it acquired before failing. An
//! overrunning load hook does not: it may still be holding those resources.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use repokit_core::{CapabilitySet, Hook, Plugin, PluginContext, RepokitError, Settings};
use tracing::{debug, warn};

use crate::discovery::Constructor;

/// A constructed instance whose load hook succeeded.
#[derive(Clone)]
pub struct LoadedPlugin {
    pub instance: Arc<dyn Plugin>,
    /// Declared capabilities the instance was verified to implement.
    pub verified: CapabilitySet,
}

impl std::fmt::Debug for LoadedPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPlugin")
            .field("verified", &self.verified)
            .finish_non_exhaustive()
    }
}

/// Drives construction, capability verification and hooks.
#[derive(Debug, Clone)]
pub struct LifecycleManager {
    hook_timeout: Duration,
}

impl LifecycleManager {
    pub fn new(hook_timeout: Duration) -> Self {
        Self { hook_timeout }
    }

    pub fn hook_timeout(&self) -> Duration {
        self.hook_timeout
    }

    /// Construct the instance, verify its capabilities and run its load hook.
    ///
    /// The load hook is invoked exactly once, and only if construction and
    /// verification succeeded. When it fails without timing out, the unload
    /// hook runs once for cleanup and the load error is returned.
    pub async fn load(
        &self,
        id: &str,
        constructor: &Constructor,
        declared: &CapabilitySet,
        settings: &Settings,
    ) -> Result<LoadedPlugin, RepokitError> {
        let instance = construct(id, constructor, settings)?;

        let verified = instance.verified_capabilities(declared);
        let missing: Vec<String> = declared
            .iter()
            .filter(|c| !verified.contains(*c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(RepokitError::Capability {
                id: id.to_string(),
                missing,
            });
        }

        let ctx = PluginContext {
            id: id.to_string(),
            settings: settings.clone(),
        };
        match self.run_hook(id, Hook::Load, instance.clone(), Some(ctx)).await {
            Ok(()) => Ok(LoadedPlugin { instance, verified }),
            Err(e @ RepokitError::HookTimeout { .. }) => Err(e),
            Err(e) => {
                if let Err(cleanup) = self.unload(id, instance).await {
                    warn!(plugin = id, error = %cleanup, "cleanup after failed load also failed");
                }
                Err(e)
            }
        }
    }

    /// Run the unload hook. Callers must hand over the only registry-held
    /// reference so that a plugin is unloaded at most once per load.
    pub async fn unload(&self, id: &str, instance: Arc<dyn Plugin>) -> Result<(), RepokitError> {
        self.run_hook(id, Hook::Unload, instance, None).await
    }

    async fn run_hook(
        &self,
        id: &str,
        hook: Hook,
        instance: Arc<dyn Plugin>,
        ctx: Option<PluginContext>,
    ) -> Result<(), RepokitError> {
        debug!(plugin = id, %hook, "running lifecycle hook");
        let handle = tokio::spawn(async move {
            match (hook, ctx) {
                (Hook::Load, Some(ctx)) => instance.on_load(&ctx).await,
                _ => instance.on_unload().await,
            }
        });

        match tokio::time::timeout(self.hook_timeout, handle).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(RepokitError::Load {
                id: id.to_string(),
                message: format!("{hook} hook failed: {e}"),
            }),
            Ok(Err(join_err)) => {
                let message = if join_err.is_panic() {
                    format!("{hook} hook panicked")
                } else {
                    format!("{hook} hook was cancelled")
                };
                Err(RepokitError::Load {
                    id: id.to_string(),
                    message,
                })
            }
            Err(_elapsed) => {
                warn!(
                    plugin = id,
                    %hook,
                    timeout_ms = self.hook_timeout.as_millis() as u64,
                    "lifecycle hook timed out; abandoning it"
                );
                Err(RepokitError::HookTimeout {
                    id: id.to_string(),
                    hook,
                    timeout: self.hook_timeout,
                })
            }
        }
    }
}

fn construct(
    id: &str,
    constructor: &Constructor,
    settings: &Settings,
) -> Result<Arc<dyn Plugin>, RepokitError> {
    let factory = match constructor {
        Constructor::Factory(factory) => factory,
        Constructor::Unresolved { name } => {
            return Err(RepokitError::Load {
                id: id.to_string(),
                message: format!("no compiled-in factory named `{name}`"),
            });
        }
    };

    match std::panic::catch_unwind(AssertUnwindSafe(|| factory.create(settings))) {
        Ok(Ok(instance)) => Ok(instance),
        Ok(Err(e)) => Err(RepokitError::Load {
            id: id.to_string(),
            message: format!("construction failed: {e}"),
        }),
        Err(_) => Err(RepokitError::Load {
            id: id.to_string(),
            message: "factory panicked".to_string(),
        }),
    }
}
