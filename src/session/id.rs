//! Session identifiers: `debug-<YYYYMMDDHHMMSS>-<8 lowercase hex>`.
//!
//! The hex suffix depends only on the issue text, so the same issue
//! submitted twice yields IDs that share a suffix.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use super::error::{SessionError, SessionResult};

pub const SESSION_ID_PREFIX: &str = "debug-";
pub const SESSION_ID_PATTERN: &str = r"^debug-[0-9]{14}-[0-9a-f]{8}$";

static SESSION_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(SESSION_ID_PATTERN).expect("valid session id pattern"));

/// First 8 hex digits of the SHA-256 of the trimmed issue text.
pub fn issue_hash(issue: &str) -> String {
    let digest = Sha256::digest(issue.trim().as_bytes());
    hex::encode(&digest[..4])
}

pub fn generate_session_id(issue: &str) -> String {
    generate_session_id_at(issue, Utc::now())
}

pub fn generate_session_id_at(issue: &str, at: DateTime<Utc>) -> String {
    format!(
        "{SESSION_ID_PREFIX}{}-{}",
        at.format("%Y%m%d%H%M%S"),
        issue_hash(issue)
    )
}

/// Hash suffix of a well-formed ID.
pub fn hash_suffix(session_id: &str) -> Option<&str> {
    SESSION_ID
        .is_match(session_id)
        .then(|| &session_id[session_id.len() - 8..])
}

/// Rejects null bytes and path separators before checking the anchored
/// format, so each violation reports its own error even when the format
/// check alone would catch it.
pub fn validate_session_id(session_id: &str) -> SessionResult<()> {
    if session_id.contains('\0') {
        return Err(SessionError::NullByte);
    }
    if session_id.contains(['/', '\\']) {
        return Err(SessionError::PathSeparator(session_id.to_string()));
    }
    if !SESSION_ID.is_match(session_id) {
        return Err(SessionError::InvalidFormat(session_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn id_embeds_timestamp_and_issue_hash() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let id = generate_session_id_at("login fails", at);
        assert!(id.starts_with("debug-20240309070501-"));
        assert_eq!(hash_suffix(&id), Some(issue_hash("login fails").as_str()));
        assert!(validate_session_id(&id).is_ok());
    }

    #[test]
    fn hash_ignores_surrounding_whitespace() {
        assert_eq!(issue_hash("  crash on save\n"), issue_hash("crash on save"));
        assert_ne!(issue_hash("crash on save"), issue_hash("crash on load"));
    }

    #[test]
    fn uppercase_hex_is_rejected() {
        assert!(matches!(
            validate_session_id("debug-20240101000000-ABCDEF12"),
            Err(SessionError::InvalidFormat(_))
        ));
    }
}
