mod common;

use cardia_history::HistoryConfig;
use cardia_history::migrate::OwnerInference;
use cardia_storage::KeyValueStore;
use serde_json::json;

use common::{ids, memory_store, memory_store_with};

fn legacy_item(id: Option<&str>, score: f64) -> serde_json::Value {
    let mut item = json!({
        "age": 47, "sex": 0, "trestbps": 118, "chol": 210,
        "result": { "risk": "low", "score": score, "hasDisease": false }
    });
    if let Some(id) = id {
        item["id"] = json!(id);
    }
    item
}

#[test]
fn migrates_legacy_key_with_email_suffix() {
    let legacy = json!([legacy_item(None, 0.2)]).to_string();
    let (_, store) = memory_store(&[("heart_assessment_history_jane@x.com", legacy.as_str())]);

    assert!(store.migrate_old_history());

    let history = store.assessment_history("jane@x.com");
    assert_eq!(history.len(), 1);
    assert!(history[0].id().is_some());
    assert!(history[0].timestamp.is_some());
}

#[test]
fn no_legacy_keys_means_no_writes() {
    let (backend, store) = memory_store(&[
        ("assessmentHistory_jane@x.com", "[]"),
        ("currentUserEmail", "jane@x.com"),
        ("theme", "dark"),
    ]);

    assert!(!store.migrate_old_history());
    assert_eq!(backend.write_count(), 0);
}

#[test]
fn migration_keeps_legacy_order() {
    let legacy = json!([
        legacy_item(Some("newest"), 0.1),
        legacy_item(Some("middle"), 0.2),
        legacy_item(Some("oldest"), 0.3),
    ])
    .to_string();
    let (_, store) = memory_store(&[("heart_history_jane@x.com", legacy.as_str())]);

    assert!(store.migrate_old_history());
    assert_eq!(
        ids(&store.assessment_history("jane@x.com")),
        vec!["newest", "middle", "oldest"]
    );
}

#[test]
fn migrated_items_go_ahead_of_existing_history() {
    let existing = json!([legacy_item(Some("current"), 0.5)]).to_string();
    let legacy = json!([legacy_item(Some("old"), 0.1)]).to_string();
    let (_, store) = memory_store(&[
        ("assessmentHistory_jane@x.com", existing.as_str()),
        ("heart_history_jane@x.com", legacy.as_str()),
    ]);

    store.migrate_old_history();
    assert_eq!(
        ids(&store.assessment_history("jane@x.com")),
        vec!["old", "current"]
    );
}

#[test]
fn unowned_key_falls_back_to_current_identity() {
    let legacy = json!([legacy_item(Some("a"), 0.1)]).to_string();
    let (_, store) = memory_store(&[
        ("assessment_history", legacy.as_str()),
        ("currentUserEmail", "bob@y.org"),
    ]);

    let report = store.try_migrate_old_history().unwrap();
    assert_eq!(report.keys[0].owner, "bob@y.org");
    assert_eq!(report.keys[0].inference, OwnerInference::CurrentIdentity);
    assert_eq!(ids(&store.assessment_history("bob@y.org")), vec!["a"]);
}

#[test]
fn unowned_key_without_identity_goes_to_placeholder() {
    let legacy = json!([legacy_item(Some("a"), 0.1)]).to_string();
    let (_, store) = memory_store(&[("heart_assessment_history", legacy.as_str())]);

    let report = store.try_migrate_old_history().unwrap();
    assert_eq!(report.keys[0].inference, OwnerInference::Placeholder);
    assert_eq!(ids(&store.assessment_history("guest@example.com")), vec!["a"]);
}

#[test]
fn owner_from_key_is_lowercased() {
    let legacy = json!([legacy_item(Some("a"), 0.1)]).to_string();
    let (_, store) = memory_store(&[("heart_history_Jane@X.com", legacy.as_str())]);

    store.migrate_old_history();
    assert_eq!(ids(&store.assessment_history("jane@x.com")), vec!["a"]);
}

#[test]
fn bad_keys_are_skipped_and_the_rest_migrate() {
    let good = json!([legacy_item(Some("ok"), 0.1)]).to_string();
    let (_, store) = memory_store(&[
        ("heart_history_a@x.com", "{broken"),
        ("heart_history_b@x.com", r#"{"not":"an array"}"#),
        ("heart_history_c@x.com", "[]"),
        ("heart_history_d@x.com", good.as_str()),
    ]);

    let report = store.try_migrate_old_history().unwrap();
    assert_eq!(report.migrated_items(), 1);
    assert_eq!(report.failed.len(), 2);
    assert_eq!(ids(&store.assessment_history("d@x.com")), vec!["ok"]);
}

#[test]
fn non_object_items_are_skipped() {
    let legacy = json!([legacy_item(Some("a"), 0.1), null, 3]).to_string();
    let (_, store) = memory_store(&[("heart_history_jane@x.com", legacy.as_str())]);

    let report = store.try_migrate_old_history().unwrap();
    assert_eq!(report.keys[0].migrated, 1);
    assert_eq!(report.keys[0].skipped, 2);
}

#[test]
fn legacy_keys_stay_unless_configured_otherwise() {
    let legacy = json!([legacy_item(Some("a"), 0.1)]).to_string();
    let entries = [("heart_history_jane@x.com", legacy.as_str())];

    let (backend, store) = memory_store(&entries);
    store.migrate_old_history();
    assert!(backend.get("heart_history_jane@x.com").unwrap().is_some());

    let config = HistoryConfig {
        remove_migrated_keys: true,
        ..HistoryConfig::default()
    };
    let (backend, store) = memory_store_with(&entries, config);
    let report = store.try_migrate_old_history().unwrap();
    assert!(report.keys[0].removed);
    assert_eq!(backend.get("heart_history_jane@x.com").unwrap(), None);
}
