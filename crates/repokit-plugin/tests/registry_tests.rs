// SPDX-FileCopyrightText: 2026 Repokit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end registry behavior over mock plugins.

use std::time::Duration;

use repokit_config::PluginsConfig;
use repokit_core::{Capability, CapabilitySet, DependencyFailure, PluginState, RepokitError, Settings, Tier};
use repokit_plugin::LifecycleEvent;
use repokit_test_utils::{HookBehavior, JournalEntry, MockPlugin, RegistryHarness, metadata};
use serde_json::json;
use tracing_test::traced_test;

fn caps(list: &[Capability]) -> CapabilitySet {
    list.iter().copied().collect()
}

fn platform() -> CapabilitySet {
    caps(&[Capability::Platform])
}

fn state_of(harness: &RegistryHarness, id: &str) -> PluginState {
    harness.registry.get(id).unwrap().state
}

#[tokio::test]
#[traced_test]
async fn higher_tier_wins_for_duplicate_id() {
    let harness = RegistryHarness::builder()
        .honest(Tier::Builtin, metadata("gitlab", "1.0.0"), platform())
        .honest(Tier::ProjectLocal, metadata("gitlab", "1.2.0"), platform())
        .start()
        .await;

    let record = harness.registry.get("gitlab").unwrap();
    assert_eq!(record.metadata.version, "1.2.0");
    assert_eq!(record.tier, Tier::ProjectLocal);
    assert_eq!(record.state, PluginState::Enabled);
    assert_eq!(harness.registry.list().len(), 1);
    assert_eq!(harness.journal.loads("gitlab"), 1);
    assert!(logs_contain("plugin overridden by higher-precedence candidate"));
}

#[tokio::test]
async fn user_tier_overrides_builtin_but_not_project() {
    let harness = RegistryHarness::builder()
        .honest(Tier::ProjectLocal, metadata("lint", "3.0.0"), caps(&[Capability::Analysis]))
        .honest(Tier::User, metadata("lint", "2.0.0"), caps(&[Capability::Analysis]))
        .honest(Tier::Builtin, metadata("lint", "1.0.0"), caps(&[Capability::Analysis]))
        .honest(Tier::User, metadata("fmt", "2.0.0"), caps(&[Capability::PostProcessing]))
        .honest(Tier::Builtin, metadata("fmt", "1.0.0"), caps(&[Capability::PostProcessing]))
        .start()
        .await;

    assert_eq!(harness.registry.get("lint").unwrap().metadata.version, "3.0.0");
    assert_eq!(harness.registry.get("fmt").unwrap().tier, Tier::User);
}

#[tokio::test]
async fn allow_list_limits_enabled_plugins() {
    let harness = RegistryHarness::builder()
        .honest(Tier::Builtin, metadata("gitlab", "1.0.0"), platform())
        .honest(Tier::Builtin, metadata("security-scan", "1.0.0"), caps(&[Capability::Analysis]))
        .honest(Tier::Builtin, metadata("monorepo", "1.0.0"), caps(&[Capability::Synthesis]))
        .enable_only(["gitlab", "security-scan"])
        .start()
        .await;

    let enabled: Vec<(String, bool)> = harness
        .registry
        .list()
        .into_iter()
        .map(|s| (s.id, s.enabled))
        .collect();
    assert_eq!(
        enabled,
        vec![
            ("gitlab".to_string(), true),
            ("monorepo".to_string(), false),
            ("security-scan".to_string(), true),
        ]
    );
    // Never loaded, so nothing to unload later.
    assert_eq!(harness.journal.loads("monorepo"), 0);

    let err = harness.registry.enable("monorepo").await.unwrap_err();
    assert!(matches!(err, RepokitError::ActivationDenied { .. }), "{err}");
    assert_eq!(state_of(&harness, "monorepo"), PluginState::Disabled);
}

#[tokio::test]
async fn disable_list_beats_allow_list() {
    let harness = RegistryHarness::builder()
        .honest(Tier::Builtin, metadata("gitlab", "1.0.0"), platform())
        .enable_only(["gitlab"])
        .disable(["gitlab"])
        .start()
        .await;
    assert_eq!(state_of(&harness, "gitlab"), PluginState::Disabled);
}

#[tokio::test]
async fn missing_dependency_keeps_plugin_disabled() {
    let harness = RegistryHarness::builder()
        .honest(
            Tier::Builtin,
            metadata("foo", "1.0.0").with_requires(["missing-dep"]),
            caps(&[Capability::Analysis]),
        )
        .start()
        .await;

    let record = harness.registry.get("foo").unwrap();
    assert_eq!(record.state, PluginState::Disabled);
    assert_eq!(record.last_error.as_ref().map(|e| e.kind.as_str()), Some("dependency"));

    let err = harness.registry.enable("foo").await.unwrap_err();
    match err {
        RepokitError::Dependency {
            id,
            failure: DependencyFailure::Missing { dependency },
        } => {
            assert_eq!(id, "foo");
            assert_eq!(dependency, "missing-dep");
        }
        other => panic!("expected missing dependency, got {other}"),
    }
    assert_eq!(state_of(&harness, "foo"), PluginState::Disabled);
    assert_eq!(harness.journal.loads("foo"), 0);
}

#[tokio::test]
async fn requires_cycle_is_caught_before_loading() {
    let analysis = caps(&[Capability::Analysis]);
    let harness = RegistryHarness::builder()
        .honest(Tier::Builtin, metadata("a", "1.0.0").with_requires(["b"]), analysis.clone())
        .honest(Tier::Builtin, metadata("b", "1.0.0").with_requires(["a"]), analysis.clone())
        .honest(Tier::Builtin, metadata("c", "1.0.0"), analysis.clone())
        .honest(Tier::Builtin, metadata("d", "1.0.0").with_requires(["a"]), analysis)
        .start()
        .await;

    for id in ["a", "b"] {
        let record = harness.registry.get(id).unwrap();
        assert_eq!(record.state, PluginState::Failed, "{id}");
        assert!(record.last_error.unwrap().message.contains("dependency cycle"));
        assert_eq!(harness.journal.loads(id), 0);
    }
    assert_eq!(state_of(&harness, "c"), PluginState::Enabled);
    // Downstream of the cycle, but not part of it.
    assert_eq!(state_of(&harness, "d"), PluginState::Disabled);

    let err = harness.registry.enable("a").await.unwrap_err();
    assert_eq!(err.kind(), "load");
}

#[tokio::test(start_paused = true)]
async fn hanging_load_hook_fails_only_that_plugin() {
    let harness = RegistryHarness::builder()
        .honest(Tier::Builtin, metadata("gitlab", "1.0.0"), platform())
        .plugin(
            Tier::Builtin,
            metadata("bar", "1.0.0"),
            caps(&[Capability::Analysis]),
            MockPlugin::new("bar")
                .exposing(Capability::Analysis)
                .load_behavior(HookBehavior::Hang),
        )
        .honest(Tier::User, metadata("monorepo", "0.3.0"), caps(&[Capability::Synthesis]))
        .with_hook_timeout(Duration::from_millis(50))
        .start()
        .await;

    let bar = harness.registry.get("bar").unwrap();
    assert_eq!(bar.state, PluginState::Failed);
    assert_eq!(bar.last_error.unwrap().kind, "timeout");

    let summary = harness.registry.summary();
    assert_eq!((summary.total, summary.active, summary.failed), (3, 2, 1));
    assert_eq!(state_of(&harness, "gitlab"), PluginState::Enabled);
    assert_eq!(state_of(&harness, "monorepo"), PluginState::Enabled);
    assert!(harness.registry.plugin("bar").is_none());
}

#[tokio::test]
async fn failing_and_panicking_hooks_are_isolated() {
    let analysis = caps(&[Capability::Analysis]);
    let harness = RegistryHarness::builder()
        .plugin(
            Tier::Builtin,
            metadata("refuses", "1.0.0"),
            analysis.clone(),
            MockPlugin::new("refuses")
                .exposing(Capability::Analysis)
                .load_behavior(HookBehavior::Fail("no credentials".into())),
        )
        .plugin(
            Tier::Builtin,
            metadata("explodes", "1.0.0"),
            analysis.clone(),
            MockPlugin::new("explodes")
                .exposing(Capability::Analysis)
                .load_behavior(HookBehavior::Panic),
        )
        .honest(Tier::Builtin, metadata("steady", "1.0.0"), analysis)
        .start()
        .await;

    let refuses = harness.registry.get("refuses").unwrap();
    assert_eq!(refuses.state, PluginState::Failed);
    assert!(refuses.last_error.unwrap().message.contains("no credentials"));
    assert_eq!(state_of(&harness, "explodes"), PluginState::Failed);
    assert_eq!(state_of(&harness, "steady"), PluginState::Enabled);
}

#[tokio::test]
async fn failed_load_hook_gets_one_cleanup_unload_per_attempt() {
    let harness = RegistryHarness::builder()
        .plugin(
            Tier::Builtin,
            metadata("partial", "1.0.0"),
            platform(),
            MockPlugin::new("partial")
                .exposing(Capability::Platform)
                .load_behavior(HookBehavior::Fail("session half open".into())),
        )
        .start()
        .await;
    assert_eq!(state_of(&harness, "partial"), PluginState::Failed);
    assert_eq!(harness.journal.loads("partial"), 1);
    assert_eq!(harness.journal.unloads("partial"), 1);

    harness.registry.reload().await;
    harness.registry.shutdown().await;

    assert_eq!(harness.journal.loads("partial"), 2);
    assert_eq!(harness.journal.unloads("partial"), 2);
}

#[tokio::test(start_paused = true)]
async fn hanging_unload_hook_is_bounded_by_the_timeout() {
    let analysis = caps(&[Capability::Analysis]);
    let harness = RegistryHarness::builder()
        .plugin(
            Tier::Builtin,
            metadata("stuck", "1.0.0"),
            analysis.clone(),
            MockPlugin::new("stuck")
                .exposing(Capability::Analysis)
                .unload_behavior(HookBehavior::Hang),
        )
        .honest(Tier::Builtin, metadata("tidy", "1.0.0"), analysis)
        .with_hook_timeout(Duration::from_millis(50))
        .start()
        .await;

    let summary = harness.registry.reload().await;
    assert_eq!((summary.active, summary.failed), (2, 0));
    assert_eq!(state_of(&harness, "stuck"), PluginState::Enabled);
    assert_eq!(harness.registry.generation(), 2);

    harness.registry.shutdown().await;
    assert_eq!(harness.journal.unloads("stuck"), 2);
    assert_eq!(harness.journal.unloads("tidy"), 2);
    assert!(harness.registry.list().is_empty());
}

#[tokio::test]
async fn undeclared_operations_fail_at_load() {
    let harness = RegistryHarness::builder()
        .plugin(
            Tier::Builtin,
            metadata("liar", "1.0.0"),
            caps(&[Capability::Platform, Capability::Analysis]),
            MockPlugin::new("liar").exposing(Capability::Platform),
        )
        .start()
        .await;

    let record = harness.registry.get("liar").unwrap();
    assert_eq!(record.state, PluginState::Failed);
    assert_eq!(record.last_error.unwrap().kind, "capability");
    assert_eq!(harness.journal.loads("liar"), 0);
}

#[tokio::test]
async fn invalid_metadata_fails_validation_without_blocking_others() {
    let harness = RegistryHarness::builder()
        .honest(Tier::Builtin, metadata("gitlab", "not-a-version"), platform())
        .honest(Tier::Builtin, metadata("monorepo", "1.0.0"), caps(&[Capability::Synthesis]))
        .start()
        .await;

    let record = harness.registry.get("gitlab").unwrap();
    assert_eq!(record.state, PluginState::Failed);
    assert_eq!(record.last_error.unwrap().kind, "validation");
    assert_eq!(state_of(&harness, "monorepo"), PluginState::Enabled);
}

#[tokio::test]
async fn reload_twice_is_stable() {
    let analysis = caps(&[Capability::Analysis]);
    let harness = RegistryHarness::builder()
        .honest(Tier::Builtin, metadata("http", "1.0.0"), analysis.clone())
        .honest(Tier::Builtin, metadata("app", "1.0.0").with_requires(["http"]), analysis.clone())
        .honest(Tier::User, metadata("orphan", "1.0.0").with_requires(["nowhere"]), analysis)
        .disable(["orphan"])
        .start()
        .await;

    let first = harness.registry.list();
    harness.registry.reload().await;
    let second = harness.registry.list();
    harness.registry.reload().await;
    let third = harness.registry.list();

    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(harness.registry.generation(), 3);
    assert_eq!(harness.journal.loads("app"), 3);
    assert_eq!(harness.journal.unloads("app"), 2);
}

#[tokio::test]
async fn reload_unloads_in_reverse_order_then_loads_forward() {
    let analysis = caps(&[Capability::Analysis]);
    let harness = RegistryHarness::builder()
        .honest(Tier::Builtin, metadata("zeta", "1.0.0"), analysis.clone())
        .honest(Tier::Builtin, metadata("app", "1.0.0").with_requires(["http"]), analysis.clone())
        .honest(Tier::Builtin, metadata("http", "1.0.0"), analysis)
        .start()
        .await;
    harness.journal.clear();

    harness.registry.reload().await;

    let load = |id: &str| JournalEntry::Load(id.to_string());
    let unload = |id: &str| JournalEntry::Unload(id.to_string());
    assert_eq!(
        harness.journal.entries(),
        vec![
            unload("zeta"),
            unload("app"),
            unload("http"),
            load("http"),
            load("app"),
            load("zeta"),
        ]
    );
}

#[tokio::test]
async fn disable_then_enable_restores_state() {
    let harness = RegistryHarness::builder()
        .honest(Tier::Builtin, metadata("gitlab", "1.0.0"), platform())
        .honest(Tier::Builtin, metadata("monorepo", "1.0.0"), caps(&[Capability::Synthesis]))
        .start()
        .await;
    let before = harness.registry.list();

    harness.registry.disable("gitlab").await.unwrap();
    assert_eq!(state_of(&harness, "gitlab"), PluginState::Disabled);
    assert!(harness.registry.plugin("gitlab").is_none());
    // Disable is a flag flip; the instance stays loaded.
    assert_eq!(harness.journal.unloads("gitlab"), 0);
    assert!(harness.registry.get("gitlab").unwrap().is_loaded());

    harness.registry.disable("gitlab").await.unwrap();
    harness.registry.enable("gitlab").await.unwrap();
    harness.registry.enable("gitlab").await.unwrap();

    assert_eq!(harness.registry.list(), before);
    assert!(harness.registry.plugin("gitlab").is_some());
    assert_eq!(harness.journal.loads("gitlab"), 1);
}

#[tokio::test]
async fn runtime_disable_survives_reload() {
    let harness = RegistryHarness::builder()
        .honest(Tier::Builtin, metadata("gitlab", "1.0.0"), platform())
        .start()
        .await;

    harness.registry.disable("gitlab").await.unwrap();
    harness.registry.reload().await;

    assert_eq!(state_of(&harness, "gitlab"), PluginState::Disabled);
    assert_eq!(harness.journal.loads("gitlab"), 1);
    assert_eq!(harness.journal.unloads("gitlab"), 1);

    // A never-loaded plugin loads on enable.
    harness.registry.enable("gitlab").await.unwrap();
    assert_eq!(state_of(&harness, "gitlab"), PluginState::Enabled);
    assert_eq!(harness.journal.loads("gitlab"), 2);
}

#[tokio::test]
async fn enable_fails_fast_when_dependency_is_disabled() {
    let analysis = caps(&[Capability::Analysis]);
    let harness = RegistryHarness::builder()
        .honest(Tier::Builtin, metadata("http", "1.0.0"), analysis.clone())
        .honest(Tier::Builtin, metadata("app", "1.0.0").with_requires(["http"]), analysis)
        .start()
        .await;

    harness.registry.disable("app").await.unwrap();
    harness.registry.disable("http").await.unwrap();

    let err = harness.registry.enable("app").await.unwrap_err();
    assert!(
        matches!(
            &err,
            RepokitError::Dependency {
                failure: DependencyFailure::Inactive { dependency },
                ..
            } if dependency == "http"
        ),
        "{err}"
    );
    assert_eq!(state_of(&harness, "app"), PluginState::Disabled);

    harness.registry.enable("http").await.unwrap();
    harness.registry.enable("app").await.unwrap();
    assert_eq!(state_of(&harness, "app"), PluginState::Enabled);
}

#[tokio::test]
#[traced_test]
async fn disabling_a_dependency_is_allowed_but_logged() {
    let analysis = caps(&[Capability::Analysis]);
    let harness = RegistryHarness::builder()
        .honest(Tier::Builtin, metadata("http", "1.0.0"), analysis.clone())
        .honest(Tier::Builtin, metadata("app", "1.0.0").with_requires(["http"]), analysis)
        .start()
        .await;

    harness.registry.disable("http").await.unwrap();
    assert_eq!(state_of(&harness, "http"), PluginState::Disabled);
    assert_eq!(state_of(&harness, "app"), PluginState::Enabled);
    assert!(logs_contain("disabling a plugin that enabled plugins depend on"));
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let harness = RegistryHarness::builder().start().await;
    assert!(matches!(
        harness.registry.get("ghost"),
        Err(RepokitError::NotFound { .. })
    ));
    assert!(matches!(
        harness.registry.enable("ghost").await,
        Err(RepokitError::NotFound { .. })
    ));
}

#[tokio::test]
async fn shutdown_unloads_each_plugin_once_in_reverse_order() {
    let analysis = caps(&[Capability::Analysis]);
    let harness = RegistryHarness::builder()
        .honest(Tier::Builtin, metadata("zeta", "1.0.0"), analysis.clone())
        .honest(Tier::Builtin, metadata("app", "1.0.0").with_requires(["http"]), analysis.clone())
        .honest(Tier::Builtin, metadata("http", "1.0.0"), analysis)
        .start()
        .await;
    harness.registry.disable("zeta").await.unwrap();

    harness.registry.shutdown().await;
    harness.registry.shutdown().await;

    assert_eq!(harness.journal.unload_order(), vec!["zeta", "app", "http"]);
    assert!(harness.registry.list().is_empty());
}

#[tokio::test]
async fn failing_unload_does_not_stop_shutdown() {
    let analysis = caps(&[Capability::Analysis]);
    let harness = RegistryHarness::builder()
        .plugin(
            Tier::Builtin,
            metadata("leaky", "1.0.0"),
            analysis.clone(),
            MockPlugin::new("leaky")
                .exposing(Capability::Analysis)
                .unload_behavior(HookBehavior::Fail("socket busy".into())),
        )
        .honest(Tier::Builtin, metadata("tidy", "1.0.0"), analysis)
        .start()
        .await;

    harness.registry.shutdown().await;
    assert_eq!(harness.journal.unloads("leaky"), 1);
    assert_eq!(harness.journal.unloads("tidy"), 1);
}

#[tokio::test]
async fn capability_queries_follow_enabled_state() {
    let harness = RegistryHarness::builder()
        .plugin(
            Tier::Builtin,
            metadata("gitlab", "1.0.0"),
            platform(),
            MockPlugin::new("gitlab")
                .exposing(Capability::Platform)
                .supporting("gitlab.com"),
        )
        .plugin(
            Tier::Builtin,
            metadata("github", "1.0.0"),
            caps(&[Capability::Platform, Capability::Analysis]),
            MockPlugin::new("github")
                .exposing(Capability::Platform)
                .exposing(Capability::Analysis)
                .supporting("github.com"),
        )
        .start()
        .await;

    let platforms: Vec<String> = harness
        .registry
        .with_capability(Capability::Platform)
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    assert_eq!(platforms, vec!["github", "gitlab"]);
    assert_eq!(harness.registry.with_capability(Capability::Analysis).len(), 1);

    let gitlab = harness
        .registry
        .platform_for("https://gitlab.com/group/project")
        .expect("gitlab claims its urls");
    let analysis = gitlab
        .as_platform()
        .unwrap()
        .analyze("https://gitlab.com/group/project")
        .await
        .unwrap();
    assert_eq!(analysis["plugin"], json!("gitlab"));

    harness.registry.disable("gitlab").await.unwrap();
    assert!(harness.registry.platform_for("https://gitlab.com/group/project").is_none());
}

#[tokio::test]
async fn configured_settings_reach_the_load_hook() {
    let mut config = PluginsConfig {
        hook_timeout_ms: 200,
        ..PluginsConfig::default()
    };
    config.settings.insert(
        "gitlab".to_string(),
        Settings::from([("token_env".to_string(), json!("GITLAB_TOKEN"))]),
    );
    let harness = RegistryHarness::builder()
        .honest(Tier::Builtin, metadata("gitlab", "1.0.0"), platform())
        .honest(Tier::Builtin, metadata("monorepo", "1.0.0"), caps(&[Capability::Synthesis]))
        .with_config(config)
        .start()
        .await;

    let seen = harness.journal.settings_seen("gitlab").unwrap();
    assert_eq!(seen["token_env"], json!("GITLAB_TOKEN"));
    assert!(harness.journal.settings_seen("monorepo").unwrap().is_empty());
    assert_eq!(
        harness.registry.get("gitlab").unwrap().settings["token_env"],
        json!("GITLAB_TOKEN")
    );
}

#[tokio::test]
async fn transitions_are_broadcast() {
    let harness = RegistryHarness::builder()
        .honest(Tier::Builtin, metadata("gitlab", "1.0.0"), platform())
        .start()
        .await;
    let mut events = harness.registry.subscribe();

    harness.registry.disable("gitlab").await.unwrap();
    harness.registry.reload().await;

    let first = events.recv().await.unwrap();
    assert_eq!(
        first,
        LifecycleEvent::Transition {
            id: "gitlab".into(),
            from: PluginState::Enabled,
            to: PluginState::Disabled,
            reason: Some("disabled at runtime".into()),
        }
    );

    let mut last = None;
    while let Ok(event) = events.try_recv() {
        last = Some(event);
    }
    assert_eq!(last, Some(LifecycleEvent::Reloaded { generation: 2 }));
}

#[tokio::test(start_paused = true)]
async fn events_arrive_after_the_snapshot_they_describe() {
    let harness = std::sync::Arc::new(
        RegistryHarness::builder()
            .honest(Tier::Builtin, metadata("gitlab", "1.0.0"), platform())
            .plugin(
                Tier::Builtin,
                metadata("slow", "1.0.0"),
                caps(&[Capability::Analysis]),
                MockPlugin::new("slow")
                    .exposing(Capability::Analysis)
                    .load_behavior(HookBehavior::Hang),
            )
            .with_hook_timeout(Duration::from_millis(50))
            .start()
            .await,
    );
    let mut events = harness.registry.subscribe();

    let writer = {
        let harness = harness.clone();
        tokio::spawn(async move { harness.registry.reload().await })
    };

    // gitlab is unloaded before the slow hook stalls the reload.
    let first = events.recv().await.unwrap();
    assert!(
        matches!(
            &first,
            LifecycleEvent::Transition { id, to: PluginState::Unloaded, .. } if id == "gitlab"
        ),
        "got {first:?}"
    );
    assert_eq!(harness.registry.generation(), 2);
    assert_eq!(state_of(&harness, "slow"), PluginState::Failed);

    writer.await.unwrap();
}

#[tokio::test]
async fn readers_see_complete_snapshots_during_writes() {
    let analysis = caps(&[Capability::Analysis]);
    let harness = std::sync::Arc::new(
        RegistryHarness::builder()
            .honest(Tier::Builtin, metadata("a", "1.0.0"), analysis.clone())
            .honest(Tier::Builtin, metadata("b", "1.0.0"), analysis)
            .start()
            .await,
    );

    let writer = {
        let harness = harness.clone();
        tokio::spawn(async move {
            for _ in 0..20 {
                harness.registry.reload().await;
            }
        })
    };
    for _ in 0..200 {
        let list = harness.registry.list();
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|s| s.enabled));
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();
    assert_eq!(harness.registry.generation(), 21);
}
