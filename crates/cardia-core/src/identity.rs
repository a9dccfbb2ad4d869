//! Identity normalization.
//!
//! An identity is a lower-cased email string. It is a client-supplied label,
//! not an authenticated principal, and its syntax is never validated.

/// Normalize a caller-supplied email into an identity.
///
/// Returns `None` for the empty string, which every store operation treats
/// as a missing argument.
pub fn normalize(email: &str) -> Option<String> {
    if email.is_empty() {
        None
    } else {
        Some(email.to_lowercase())
    }
}

/// Placeholder owner for migrated data whose identity cannot be inferred.
pub const GUEST_IDENTITY: &str = "guest@example.com";
