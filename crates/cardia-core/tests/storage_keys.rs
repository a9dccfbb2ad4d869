use cardia_core::storage_keys;

#[test]
fn history_key_uses_current_scheme() {
    assert_eq!(
        storage_keys::history("jane@x.com"),
        "assessmentHistory_jane@x.com"
    );
    assert_eq!(
        storage_keys::history_identity("assessmentHistory_jane@x.com"),
        Some("jane@x.com")
    );
}

#[test]
fn legacy_patterns_are_recognized() {
    assert!(storage_keys::is_legacy_key("heart_assessment_history_jane@x.com"));
    assert!(storage_keys::is_legacy_key("assessment_history"));
    assert!(storage_keys::is_legacy_key("user_assessment_history_bob@y.org"));
    assert!(storage_keys::is_legacy_key("heart_history_bob@y.org"));
}

#[test]
fn current_scheme_and_unrelated_keys_are_not_legacy() {
    assert!(!storage_keys::is_legacy_key("assessmentHistory_jane@x.com"));
    assert!(!storage_keys::is_legacy_key("currentUserEmail"));
    assert!(!storage_keys::is_legacy_key("theme"));
    assert!(!storage_keys::is_legacy_key("my_heart_history"));
}

#[test]
fn owner_hint_takes_last_segment_with_at_sign() {
    assert_eq!(
        storage_keys::legacy_owner_hint("heart_assessment_history_jane@x.com"),
        Some("jane@x.com")
    );
    assert_eq!(storage_keys::legacy_owner_hint("heart_assessment_history"), None);
    assert_eq!(storage_keys::legacy_owner_hint("heart_history_"), None);
}

#[test]
fn owner_hint_truncates_emails_with_underscores() {
    assert_eq!(
        storage_keys::legacy_owner_hint("heart_history_jane_doe@x.com"),
        Some("doe@x.com")
    );
}
