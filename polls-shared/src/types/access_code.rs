use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::PostValidationError;

/// Longest access code a post owner may choose.
pub const ACCESS_CODE_MAX_LEN: usize = 12;

/// A shared secret unlocking a private post, normalised to trimmed uppercase.
///
/// Only ever held on the write path (post creation) and inside the store.
/// Fetched posts never carry it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCode(String);

impl AccessCode {
    /// Parses and normalises a code supplied by a post owner.
    pub fn parse(raw: &str) -> Result<Self, PostValidationError> {
        let normalized = Self::normalize(raw);
        if normalized.is_empty() {
            return Err(PostValidationError::MissingAccessCode);
        }
        if normalized.chars().count() > ACCESS_CODE_MAX_LEN {
            return Err(PostValidationError::InvalidAccessCode(format!(
                "must be at most {} characters",
                ACCESS_CODE_MAX_LEN
            )));
        }
        if normalized.chars().any(char::is_whitespace) {
            return Err(PostValidationError::InvalidAccessCode(
                "must not contain whitespace".to_string(),
            ));
        }
        Ok(Self(normalized))
    }

    /// Normalisation applied to both stored codes and submitted attempts.
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_uppercase()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a submitted attempt.
    pub fn matches(&self, attempt: &str) -> bool {
        self.0 == Self::normalize(attempt)
    }
}

// Keep the secret out of logs.
impl fmt::Debug for AccessCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessCode(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_to_uppercase() {
        let code = AccessCode::parse("  abc123 ").unwrap();
        assert_eq!(code.as_str(), "ABC123");
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let code = AccessCode::parse("ABC123").unwrap();
        assert!(code.matches("abc123"));
        assert!(code.matches(" AbC123"));
        assert!(!code.matches("ABC124"));
    }

    #[test]
    fn test_parse_rejects_empty_and_long_codes() {
        assert_eq!(
            AccessCode::parse("   "),
            Err(PostValidationError::MissingAccessCode)
        );
        assert!(matches!(
            AccessCode::parse("ABCDEFGHIJKLM"),
            Err(PostValidationError::InvalidAccessCode(_))
        ));
        assert!(matches!(
            AccessCode::parse("AB C"),
            Err(PostValidationError::InvalidAccessCode(_))
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        let code = AccessCode::parse("SECRET").unwrap();
        assert!(!format!("{:?}", code).contains("SECRET"));
    }
}
