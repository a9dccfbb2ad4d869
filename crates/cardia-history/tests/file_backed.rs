mod common;

use cardia_history::AssessmentHistoryStore;
use cardia_storage::FileStore;

use common::{ids, record};

#[test]
fn history_survives_reopening_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");

    {
        let store = AssessmentHistoryStore::new(FileStore::open(&path));
        store.save_current_email("Jane@X.com");
        store.save_assessment("jane@x.com", record(0.2).with_id("first"));
        store.save_assessment("jane@x.com", record(0.8).with_id("second"));
    }

    let store = AssessmentHistoryStore::new(FileStore::open(&path));
    assert_eq!(store.current_email().as_deref(), Some("jane@x.com"));
    assert_eq!(
        ids(&store.assessment_history("jane@x.com")),
        vec!["second", "first"]
    );

    store.delete_history_item("jane@x.com", "second");
    assert_eq!(ids(&store.assessment_history("jane@x.com")), vec!["first"]);
}
