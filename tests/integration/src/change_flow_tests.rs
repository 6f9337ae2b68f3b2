//! End-to-end change-flow tests: cache coherence under provider updates,
//! reconciliation of deletions and language clears, and service
//! readiness/disposal.

use std::sync::{Arc, Mutex};

use pref_engine::Error;
use pref_model::{PreferenceChange, Scope};
use pref_test_utils::ServiceHarness;
use pretty_assertions::assert_eq;
use serde_json::json;

fn record_changes(harness: &ServiceHarness) -> (Arc<Mutex<Vec<PreferenceChange>>>, pref_model::Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let subscription = harness
        .service
        .on_preference_changed(move |change| sink.lock().unwrap().push(change.clone()));
    (seen, subscription)
}

#[test]
fn test_cached_reads_observe_provider_changes() {
    let harness = ServiceHarness::builder()
        .value(Scope::User, "editor.fontSize", json!(12))
        .build();

    // Prime the cache, then change the backing value.
    assert_eq!(harness.service.get::<u32>("editor.fontSize"), Some(12));

    let event_fired = Arc::new(Mutex::new(false));
    let subscription = {
        let event_fired = event_fired.clone();
        let service = harness.service.clone();
        harness.service.on_preference_changed(move |change| {
            // The event fires after invalidation: a re-read from inside
            // the listener already sees the new value.
            assert_eq!(service.get::<u32>(&change.name), Some(16));
            *event_fired.lock().unwrap() = true;
        })
    };

    harness
        .provider(Scope::User)
        .set_value("editor.fontSize", Some(json!(16)), vec![]);

    assert!(*event_fired.lock().unwrap());
    assert_eq!(harness.service.get::<u32>("editor.fontSize"), Some(16));
    drop(subscription);
}

#[test]
fn test_deletion_reattributes_to_surviving_lower_scope() {
    let harness = ServiceHarness::builder()
        .register("window.zoomLevel", Scope::Workspace)
        .value(Scope::User, "window.zoomLevel", json!(1))
        .value(Scope::Workspace, "window.zoomLevel", json!(2))
        .build();
    let (seen, subscription) = record_changes(&harness);

    harness
        .provider(Scope::Workspace)
        .set_value("window.zoomLevel", None, vec![]);

    let changes = seen.lock().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].scope, Scope::User);
    assert_eq!(changes[0].new_value, Some(json!(1)));
    drop(changes);
    drop(subscription);

    assert_eq!(harness.service.get::<u32>("window.zoomLevel"), Some(1));
}

#[test]
fn test_default_deletion_with_surviving_user_value() {
    let harness = ServiceHarness::builder()
        .register("update.channel", Scope::User)
        .value(Scope::Default, "update.channel", json!("stable"))
        .value(Scope::User, "update.channel", json!("beta"))
        .build();
    let (seen, subscription) = record_changes(&harness);

    harness
        .provider(Scope::Default)
        .set_value("update.channel", None, vec![]);

    // Not suppressed and not emitted as an undefined value: the change
    // carries the surviving user value at user scope.
    let changes = seen.lock().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].scope, Scope::User);
    assert_eq!(changes[0].new_value, Some(json!("beta")));
    drop(changes);
    drop(subscription);
}

#[test]
fn test_shadowed_edit_is_not_emitted_but_cache_stays_fresh() {
    let harness = ServiceHarness::builder()
        .register("window.zoomLevel", Scope::Workspace)
        .value(Scope::Workspace, "window.zoomLevel", json!(2))
        .build();
    assert_eq!(harness.service.get::<u32>("window.zoomLevel"), Some(2));
    let (seen, subscription) = record_changes(&harness);

    // A user-scope edit is invisible under the workspace value.
    harness
        .provider(Scope::User)
        .set_value("window.zoomLevel", Some(json!(1)), vec![]);

    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(harness.service.get::<u32>("window.zoomLevel"), Some(2));
    drop(subscription);
}

#[test]
fn test_language_clear_falls_back_to_lower_language_value() {
    let harness = ServiceHarness::builder()
        .register("editor.tabSize", Scope::Workspace)
        .language_value(Scope::Default, "json", "editor.tabSize", json!(3))
        .language_value(Scope::Workspace, "json", "editor.tabSize", json!(2))
        .build();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let subscription = {
        let seen = seen.clone();
        harness
            .service
            .on_language_preferences_changed(move |event| {
                seen.lock()
                    .unwrap()
                    .push((event.language.clone(), event.changes.clone()));
            })
    };

    harness
        .provider(Scope::Workspace)
        .set_language_value("json", "editor.tabSize", None, vec![]);

    let events = seen.lock().unwrap();
    assert_eq!(events.len(), 1);
    let (language, changes) = &events[0];
    assert_eq!(language, "json");
    let change = &changes["editor.tabSize"];
    assert_eq!(change.scope, Scope::Default);
    assert_eq!(change.new_value, Some(json!(3)));
    drop(events);
    drop(subscription);

    assert_eq!(
        harness.service.resolve::<u32>("editor.tabSize", None, Some("json")).value,
        Some(3)
    );
}

#[test]
fn test_language_clear_with_no_fallback_demotes_to_plain_change() {
    let harness = ServiceHarness::builder()
        .register("editor.tabSize", Scope::Workspace)
        .value(Scope::User, "editor.tabSize", json!(4))
        .language_value(Scope::Default, "json", "editor.tabSize", json!(2))
        .build();
    let (plain_changes, plain_subscription) = record_changes(&harness);

    let language_events = Arc::new(Mutex::new(0usize));
    let language_subscription = {
        let language_events = language_events.clone();
        harness
            .service
            .on_language_preferences_changed(move |_| {
                *language_events.lock().unwrap() += 1;
            })
    };

    // Clearing the last "json" value anywhere: the change is re-emitted
    // as a plain change carrying the full non-language resolution.
    harness
        .provider(Scope::Default)
        .set_language_value("json", "editor.tabSize", None, vec![]);

    assert_eq!(*language_events.lock().unwrap(), 0);
    let changes = plain_changes.lock().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].scope, Scope::User);
    assert_eq!(changes[0].new_value, Some(json!(4)));
    drop(changes);
    drop(plain_subscription);
    drop(language_subscription);
}

#[test]
fn test_batched_event_fires_once_per_reconciliation_pass() {
    let harness = ServiceHarness::builder().build();

    let batches = Arc::new(Mutex::new(Vec::new()));
    let subscription = {
        let batches = batches.clone();
        harness.service.on_preferences_changed(move |changes| {
            batches.lock().unwrap().push(changes.len());
        })
    };

    harness
        .provider(Scope::User)
        .set_value("editor.fontSize", Some(json!(14)), vec![]);
    harness
        .provider(Scope::User)
        .set_value("editor.tabSize", Some(json!(2)), vec![]);

    // Two provider batches, one aggregate event each.
    assert_eq!(*batches.lock().unwrap(), vec![1, 1]);
    drop(subscription);
}

#[tokio::test]
async fn test_service_readiness_waits_for_all_providers() {
    let harness = ServiceHarness::builder().pending(Scope::Folder).build();

    let waiter = {
        let service = harness.service.clone();
        tokio::spawn(async move { service.when_ready().await })
    };
    harness.provider(Scope::Folder).mark_ready();
    waiter.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_provider_failure_rejects_service_readiness() {
    let harness = ServiceHarness::builder().pending(Scope::User).build();
    harness.provider(Scope::User).fail_ready("settings file corrupt");

    let error = harness.service.when_ready().await.unwrap_err();
    assert!(error.to_string().contains("settings file corrupt"));
}

#[tokio::test]
async fn test_disposal_rejects_pending_waiters_and_detaches() {
    let harness = ServiceHarness::builder().pending(Scope::User).build();

    let waiter = {
        let service = harness.service.clone();
        tokio::spawn(async move { service.when_ready().await })
    };
    harness.service.dispose();
    assert!(matches!(waiter.await.unwrap().unwrap_err(), Error::Disposed));

    let (seen, subscription) = record_changes(&harness);
    harness
        .provider(Scope::User)
        .set_value("editor.fontSize", Some(json!(1)), vec![]);
    assert!(seen.lock().unwrap().is_empty());
    drop(subscription);
}
