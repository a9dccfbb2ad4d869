//! Storage key conventions.
//!
//! Pure string functions, no storage dependency. These define the canonical
//! layout of values in the key-value store, and must stay byte-compatible
//! with data already written by earlier clients.

/// Slot holding the most recently signed-in identity.
pub const CURRENT_USER_EMAIL: &str = "currentUserEmail";

/// Prefix of every per-identity history partition in the current scheme.
pub const HISTORY_PREFIX: &str = "assessmentHistory_";

/// Substrings that mark a key as belonging to a legacy history scheme.
/// `heart_assessment_history` is listed for completeness; it already
/// contains `assessment_history`.
pub const LEGACY_SUBSTRINGS: [&str; 2] = ["assessment_history", "heart_assessment_history"];

/// Prefix of the oldest legacy history scheme.
pub const LEGACY_PREFIX: &str = "heart_history_";

/// Partition key for an already-normalized identity.
pub fn history(identity: &str) -> String {
    format!("{HISTORY_PREFIX}{identity}")
}

pub fn is_history_key(key: &str) -> bool {
    key.starts_with(HISTORY_PREFIX)
}

/// The identity portion of a current-scheme key, exactly as stored
/// (not re-normalized).
pub fn history_identity(key: &str) -> Option<&str> {
    key.strip_prefix(HISTORY_PREFIX)
}

pub fn is_legacy_key(key: &str) -> bool {
    !is_history_key(key)
        && (LEGACY_SUBSTRINGS.iter().any(|s| key.contains(s)) || key.starts_with(LEGACY_PREFIX))
}

/// Best-effort owner of a legacy key: the last `_`-separated segment, if it
/// looks like an email (contains `@`).
///
/// Lossy by construction. An email that itself contains `_` is truncated
/// to the part after its last underscore.
pub fn legacy_owner_hint(key: &str) -> Option<&str> {
    key.rsplit('_')
        .next()
        .filter(|segment| segment.contains('@'))
}
