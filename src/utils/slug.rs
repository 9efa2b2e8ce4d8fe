//! Slug format rules and random slug generation.

use crate::error::AppError;
use base64::Engine as _;
use serde_json::json;

/// Random bytes behind a generated slug. 6 bytes encode to 8 base64 characters.
const GENERATED_SLUG_BYTES: usize = 6;

/// Longest slug accepted on create or rename.
pub const MAX_SLUG_LENGTH: usize = 64;

/// First path segments already routed by the service itself.
pub const RESERVED_SLUGS: &[&str] = &["api", "health", "preview"];

/// Returns true if `slug` matches `^[A-Za-z0-9_-]+$` and fits the length limit.
///
/// Reserved route segments pass this check; they are rejected separately by
/// [`slug_error`] so that lookups stay a pure format test.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LENGTH
        && slug
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Describes why `slug` cannot be used for a new or renamed link.
pub fn slug_error(slug: &str) -> Option<String> {
    if slug.is_empty() {
        return Some("Slug must not be empty".to_string());
    }
    if slug.len() > MAX_SLUG_LENGTH {
        return Some(format!("Slug must be at most {MAX_SLUG_LENGTH} characters"));
    }
    if !is_valid_slug(slug) {
        return Some(
            "Slug can only contain letters, digits, hyphens and underscores".to_string(),
        );
    }
    if RESERVED_SLUGS.contains(&slug) {
        return Some("This slug is reserved".to_string());
    }
    None
}

/// Generates a random 8-character URL-safe slug.
///
/// The alphabet (`A-Z a-z 0-9 - _`) is exactly the slug alphabet.
///
/// # Errors
///
/// Returns [`AppError::Internal`] if the system random number generator fails.
pub fn generate_slug() -> Result<String, AppError> {
    let mut buffer = [0u8; GENERATED_SLUG_BYTES];

    getrandom::fill(&mut buffer).map_err(|e| {
        AppError::internal(
            "Failed to generate random slug",
            json!({ "reason": e.to_string() }),
        )
    })?;

    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_slug_length() {
        assert_eq!(generate_slug().unwrap().len(), 8);
    }

    #[test]
    fn test_generated_slug_is_valid() {
        for _ in 0..200 {
            let slug = generate_slug().unwrap();
            assert!(is_valid_slug(&slug), "generated slug {slug} is invalid");
        }
    }

    #[test]
    fn test_generated_slugs_are_unique() {
        let slugs: HashSet<String> = (0..1000).map(|_| generate_slug().unwrap()).collect();
        assert_eq!(slugs.len(), 1000);
    }

    #[test]
    fn test_valid_slugs() {
        assert!(is_valid_slug("launch"));
        assert!(is_valid_slug("Launch_2026"));
        assert!(is_valid_slug("a-b-c"));
        assert!(is_valid_slug("_"));
        assert!(slug_error("summer-sale").is_none());
    }

    #[test]
    fn test_rejects_spaces_and_punctuation() {
        assert!(!is_valid_slug("bad slug!"));
        assert!(!is_valid_slug("a/b"));
        assert!(!is_valid_slug("caf\u{e9}"));
        assert!(slug_error("bad slug!").is_some());
    }

    #[test]
    fn test_rejects_empty() {
        assert!(!is_valid_slug(""));
        assert_eq!(slug_error("").unwrap(), "Slug must not be empty");
    }

    #[test]
    fn test_rejects_too_long() {
        let long = "a".repeat(MAX_SLUG_LENGTH + 1);
        assert!(!is_valid_slug(&long));
        assert!(slug_error(&long).unwrap().contains("at most"));
        assert!(slug_error(&"a".repeat(MAX_SLUG_LENGTH)).is_none());
    }

    #[test]
    fn test_reserved_slugs() {
        for &reserved in RESERVED_SLUGS {
            assert!(is_valid_slug(reserved));
            assert_eq!(slug_error(reserved).unwrap(), "This slug is reserved");
        }
    }

    #[test]
    fn test_case_is_significant() {
        assert!(slug_error("API").is_none());
    }
}
