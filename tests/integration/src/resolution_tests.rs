//! End-to-end resolution tests: precedence, merging, language overlay,
//! dotted-path fallback, inspection, and write routing across the whole
//! service stack.

use pref_engine::Error;
use pref_model::Scope;
use pref_provider::PreferenceProvider;
use pref_test_utils::ServiceHarness;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_highest_scope_wins_for_scalar_values() {
    let harness = ServiceHarness::builder()
        .value(Scope::Default, "editor.fontSize", json!(12))
        .value(Scope::User, "editor.fontSize", json!(14))
        .value(Scope::Workspace, "editor.fontSize", json!(16))
        .value(Scope::Folder, "editor.fontSize", json!(18))
        .build();

    let result = harness.service.resolve::<u32>("editor.fontSize", None, None);
    assert_eq!(result.value, Some(18));
    assert_eq!(result.scope, Scope::Folder);
}

#[test]
fn test_records_merge_key_wise_with_attribution() {
    let harness = ServiceHarness::builder()
        .value(Scope::Default, "files.exclude", json!({"a": 1, "b": 2}))
        .value(Scope::User, "files.exclude", json!({"b": 3, "c": 4}))
        .build();

    let result = harness
        .service
        .resolve::<serde_json::Value>("files.exclude", None, None);
    assert_eq!(result.value, Some(json!({"a": 1, "b": 3, "c": 4})));
    assert_eq!(result.scope, Scope::User);
}

#[test]
fn test_language_overlay_with_default_only_value() {
    let harness = ServiceHarness::builder()
        .value(Scope::User, "editor.tabSize", json!(4))
        .language_value(Scope::Default, "json", "editor.tabSize", json!(2))
        .build();

    let with_language =
        harness
            .service
            .resolve::<u32>("editor.tabSize", Some("file:///ws/a.json"), Some("json"));
    assert_eq!(with_language.value, Some(2));
    assert!(with_language.language_specific);

    let without_language =
        harness
            .service
            .resolve::<u32>("editor.tabSize", Some("file:///ws/a.json"), None);
    assert_eq!(without_language.value, Some(4));
    assert!(!without_language.language_specific);
}

#[test]
fn test_dotted_path_fallback_recovers_container_values() {
    let harness = ServiceHarness::builder()
        .value(Scope::User, "editor", json!({"fontSize": 12}))
        .build();

    // No direct provider entry for the leaf name; the container answers.
    assert_eq!(harness.service.get::<u32>("editor.fontSize"), Some(12));

    let result = harness.service.resolve::<u32>("editor.fontSize", None, None);
    assert_eq!(result.scope, Scope::User);
}

#[test]
fn test_dotted_path_uses_longest_defined_prefix() {
    let harness = ServiceHarness::builder()
        .value(Scope::User, "a", json!({"b": {"c": 1}}))
        .value(Scope::User, "a.b", json!({"c": 2}))
        .build();

    // "a.b" is the longest defined prefix and wins over "a".
    assert_eq!(harness.service.get::<u32>("a.b.c"), Some(2));
}

#[test]
fn test_caller_default_applies_only_when_nothing_contributes() {
    let harness = ServiceHarness::builder()
        .value(Scope::User, "editor.fontSize", json!(14))
        .build();

    assert_eq!(harness.service.get_with_default("editor.fontSize", 10), 14);
    assert_eq!(harness.service.get_with_default("editor.lineHeight", 20), 20);

    // The substituted default is never cached: a different default is
    // honored on the next call.
    assert_eq!(harness.service.get_with_default("editor.lineHeight", 22), 22);
}

#[test]
fn test_scope_eligibility_filters_contributions() {
    let harness = ServiceHarness::builder()
        .register("update.channel", Scope::User)
        .value(Scope::Default, "update.channel", json!("stable"))
        .value(Scope::Workspace, "update.channel", json!("beta"))
        .build();

    // The workspace value is not eligible for a user-scoped preference.
    assert_eq!(
        harness.service.get::<String>("update.channel"),
        Some("stable".to_string())
    );
}

#[test]
fn test_inspect_shows_per_scope_values_without_merging() {
    let harness = ServiceHarness::builder()
        .value(Scope::Default, "editor.fontSize", json!(12))
        .value(Scope::User, "editor.fontSize", json!(14))
        .value(Scope::Folder, "editor.fontSize", json!(18))
        .build();

    let inspection = harness.service.inspect::<u32>("editor.fontSize", None);
    assert_eq!(inspection.default_value, Some(12));
    assert_eq!(inspection.user_value, Some(14));
    assert_eq!(inspection.workspace_value, None);
    assert_eq!(inspection.folder_value, Some(18));
}

#[test]
fn test_preferences_snapshot() {
    let harness = ServiceHarness::builder()
        .register("editor.fontSize", Scope::Folder)
        .register("editor.tabSize", Scope::Folder)
        .register("update.channel", Scope::User)
        .value(Scope::Default, "editor.fontSize", json!(12))
        .value(Scope::User, "update.channel", json!("beta"))
        .build();

    let snapshot = harness.service.preferences(None);
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot["editor.fontSize"], json!(12));
    assert_eq!(snapshot["update.channel"], json!("beta"));
}

#[tokio::test]
async fn test_write_lands_in_the_routed_scope() {
    let harness = ServiceHarness::builder().build();

    // No explicit scope and no resource: workspace.
    harness
        .service
        .set("editor.fontSize", Some(json!(15)), None, None)
        .await
        .unwrap();
    assert_eq!(
        harness
            .provider(Scope::Workspace)
            .get("editor.fontSize", None, None),
        Some(json!(15))
    );

    // A resource anchors the write to the folder scope.
    harness
        .service
        .set("editor.tabSize", Some(json!(2)), None, Some("file:///ws/pkg"))
        .await
        .unwrap();
    assert_eq!(
        harness
            .provider(Scope::Folder)
            .get("editor.tabSize", None, None),
        Some(json!(2))
    );
}

#[tokio::test]
async fn test_folder_write_without_resource_is_rejected() {
    let harness = ServiceHarness::builder().build();

    let error = harness
        .service
        .set("editor.fontSize", Some(json!(15)), Some(Scope::Folder), None)
        .await
        .unwrap_err();
    assert!(matches!(error, Error::NoResourceProvided { .. }));
    assert_eq!(
        harness
            .provider(Scope::Folder)
            .get("editor.fontSize", None, None),
        None
    );
}

#[tokio::test]
async fn test_workspace_only_section_cannot_be_written_globally() {
    let harness = ServiceHarness::builder()
        .workspace_only_section("tasks")
        .build();

    let error = harness
        .service
        .set("tasks.version", Some(json!("2")), Some(Scope::User), None)
        .await
        .unwrap_err();
    assert!(matches!(error, Error::SectionNotGlobal { .. }));
    assert_eq!(
        harness.provider(Scope::User).get("tasks.version", None, None),
        None
    );
}

#[tokio::test]
async fn test_write_becomes_visible_through_resolution() {
    let harness = ServiceHarness::builder()
        .value(Scope::Default, "editor.fontSize", json!(12))
        .build();
    assert_eq!(harness.service.get::<u32>("editor.fontSize"), Some(12));

    harness
        .service
        .set("editor.fontSize", Some(json!(15)), Some(Scope::User), None)
        .await
        .unwrap();
    assert_eq!(harness.service.get::<u32>("editor.fontSize"), Some(15));

    // Deleting the user value falls back to the default.
    harness
        .service
        .set("editor.fontSize", None, Some(Scope::User), None)
        .await
        .unwrap();
    assert_eq!(harness.service.get::<u32>("editor.fontSize"), Some(12));
}
