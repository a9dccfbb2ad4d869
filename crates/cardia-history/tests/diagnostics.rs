mod common;

use cardia_history::diagnostics::PartitionStatus;
use serde_json::json;

use common::memory_store;

#[test]
fn debug_history_reports_everything_without_writing() {
    let good = json!([{ "id": "a" }, { "id": "b" }]).to_string();
    let (backend, store) = memory_store(&[
        ("currentUserEmail", "jane@x.com"),
        ("assessmentHistory_jane@x.com", good.as_str()),
        ("assessmentHistory_bad@x.com", "{oops"),
        ("assessmentHistory_obj@x.com", "{}"),
        ("heart_history_old@x.com", "[]"),
        ("theme", "dark"),
    ]);

    let report = store.debug_history();

    assert_eq!(report.current_email.as_deref(), Some("jane@x.com"));
    assert_eq!(report.keys.len(), 6);
    assert_eq!(report.partition_keys.len(), 3);
    assert_eq!(report.legacy_keys, vec!["heart_history_old@x.com"]);

    let status = |key: &str| {
        report
            .partitions
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.status.clone())
            .unwrap()
    };
    assert_eq!(
        status("assessmentHistory_jane@x.com"),
        PartitionStatus::Ok { records: 2 }
    );
    assert!(matches!(
        status("assessmentHistory_bad@x.com"),
        PartitionStatus::InvalidJson { .. }
    ));
    assert_eq!(
        status("assessmentHistory_obj@x.com"),
        PartitionStatus::NotArray {
            found: "object".to_string()
        }
    );
    assert_eq!(backend.write_count(), 0);
}

#[test]
fn diagnostics_serialize_with_flat_status() {
    let (_, store) = memory_store(&[("assessmentHistory_jane@x.com", "[]")]);
    let value = serde_json::to_value(store.debug_history()).unwrap();

    assert_eq!(value["partitions"][0]["status"], json!("ok"));
    assert_eq!(value["partitions"][0]["records"], json!(0));
    assert_eq!(value["current_email"], json!(null));
}
