use cardia_storage::{KeyValueStore, MemoryStore, StorageError};

#[test]
fn set_get_remove() {
    let store = MemoryStore::new();
    assert_eq!(store.get("k").unwrap(), None);

    store.set("k", "v").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));

    store.remove("k").unwrap();
    assert_eq!(store.get("k").unwrap(), None);
    assert_eq!(store.write_count(), 2);
}

#[test]
fn removing_absent_key_is_not_an_error() {
    let store = MemoryStore::new();
    store.remove("missing").unwrap();
}

#[test]
fn seeded_entries_do_not_count_as_writes() {
    let store = MemoryStore::with_entries([("b", "2"), ("a", "1")]);
    assert_eq!(store.write_count(), 0);
    assert_eq!(store.list_keys().unwrap(), vec!["a", "b"]);
}

#[test]
fn compare_and_set_rejects_stale_expectation() {
    let store = MemoryStore::with_entries([("k", "old")]);

    let err = store.compare_and_set("k", Some("stale"), "new").unwrap_err();
    assert!(matches!(err, StorageError::PreconditionFailed { key } if key == "k"));
    assert_eq!(store.get("k").unwrap().as_deref(), Some("old"));

    store.compare_and_set("k", Some("old"), "new").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("new"));
}

#[test]
fn compare_and_set_with_none_requires_absent_key() {
    let store = MemoryStore::new();
    store.compare_and_set("k", None, "first").unwrap();
    assert!(store.compare_and_set("k", None, "second").is_err());
    assert_eq!(store.get("k").unwrap().as_deref(), Some("first"));
}
