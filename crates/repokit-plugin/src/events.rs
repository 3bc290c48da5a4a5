// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lifecycle events broadcast by the registry.

use repokit_core::PluginState;
use serde::Serialize;

/// Buffered events per subscriber before the oldest are dropped.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Something observable happened to the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A plugin record changed state.
    Transition {
        id: String,
        from: PluginState,
        to: PluginState,
        reason: Option<String>,
    },
    /// A reload finished and its index was published.
    Reloaded { generation: u64 },
}

impl LifecycleEvent {
    /// Plugin id for transitions, `None` for registry-wide events.
    pub fn plugin_id(&self) -> Option<&str> {
        match self {
            LifecycleEvent::Transition { id, .. } => Some(id),
            LifecycleEvent::Reloaded { .. } => None,
        }
    }
}
