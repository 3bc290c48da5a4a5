// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Repokit integration tests.
//!
//! # Components
//!
//! - [`MockPlugin`] - Plugin with scriptable hooks and selectable capabilities
//! - [`RegistryHarness`] - Registry over mock plugins at any tier

pub mod harness;
pub mod mock_plugin;

pub use harness::{RegistryHarness, RegistryHarnessBuilder, metadata};
pub use mock_plugin::{HookBehavior, Journal, JournalEntry, MockPlugin};
