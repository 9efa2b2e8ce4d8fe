//! Field-level validation for link and settings input.

use crate::domain::entities::LinkMetadata;
use crate::error::AppError;
use serde_json::{Map, Value, json};
use url::Url;
use validator::ValidateEmail;

pub const MAX_TITLE_LENGTH: usize = 300;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;
pub const MAX_URL_LENGTH: usize = 2048;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Collects per-field validation messages and turns them into one error.
#[derive(Debug, Default)]
pub struct FieldErrors {
    fields: Map<String, Value>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .insert(field.to_string(), Value::String(message.into()));
    }

    pub fn check(&mut self, field: &str, problem: Option<String>) {
        if let Some(message) = problem {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validates an absolute `http`/`https` URL and returns its serialized
    /// form: tabs and newlines removed, non-ASCII percent-encoded, host
    /// lowercased. On failure the problem is recorded and `input` is returned
    /// unchanged; callers must not persist anything once an error exists.
    pub fn http_url(&mut self, field: &str, input: &str) -> String {
        match parse_http_url(input) {
            Ok(url) => url.into(),
            Err(problem) => {
                self.add(field, problem);
                input.to_string()
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`AppError::Validation`] listing every collected field.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            return Ok(());
        }
        Err(AppError::bad_request(
            "Validation failed",
            json!({ "fields": Value::Object(self.fields) }),
        ))
    }
}

/// Parses an absolute `http`/`https` URL with a host.
///
/// The length limit applies to the serialized form, which is what gets
/// stored and sent as `Location`.
pub fn parse_http_url(input: &str) -> Result<Url, String> {
    if input.len() > MAX_URL_LENGTH {
        return Err(format!("URL must be at most {MAX_URL_LENGTH} characters"));
    }

    let url = Url::parse(input.trim()).map_err(|e| format!("Invalid URL: {e}"))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err("Only http and https URLs are allowed".to_string());
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err("URL must have a host".to_string());
    }
    if url.as_str().len() > MAX_URL_LENGTH {
        return Err(format!("URL must be at most {MAX_URL_LENGTH} characters once encoded"));
    }

    Ok(url)
}

/// Validates preview metadata, reporting problems as `metadata.<field>`.
///
/// Returns the metadata with `image` in its serialized URL form.
pub fn check_metadata(errors: &mut FieldErrors, metadata: LinkMetadata) -> LinkMetadata {
    if let Some(title) = &metadata.title
        && title.chars().count() > MAX_TITLE_LENGTH
    {
        errors.add(
            "metadata.title",
            format!("Title must be at most {MAX_TITLE_LENGTH} characters"),
        );
    }

    if let Some(description) = &metadata.description
        && description.chars().count() > MAX_DESCRIPTION_LENGTH
    {
        errors.add(
            "metadata.description",
            format!("Description must be at most {MAX_DESCRIPTION_LENGTH} characters"),
        );
    }

    let image = metadata
        .image
        .map(|image| errors.http_url("metadata.image", &image));

    LinkMetadata { image, ..metadata }
}

pub fn email_error(email: &str) -> Option<String> {
    if email.validate_email() {
        None
    } else {
        Some("Invalid email address".to_string())
    }
}

/// Checks `page >= 1` and `limit` in `1..=MAX_PAGE_LIMIT`.
pub fn check_pagination(errors: &mut FieldErrors, page: u32, limit: u32) {
    if page == 0 {
        errors.add("page", "Page must be at least 1");
    }
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        errors.add(
            "limit",
            format!("Limit must be between 1 and {MAX_PAGE_LIMIT}"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url_error(input: &str) -> bool {
        parse_http_url(input).is_err()
    }

    #[test]
    fn test_accepts_http_and_https() {
        assert!(!url_error("https://example.com/x"));
        assert!(!url_error("http://example.com:8080/a?b=c#d"));
    }

    #[test]
    fn test_rejects_relative_and_garbage() {
        assert!(url_error("/relative/path"));
        assert!(url_error("not a url"));
        assert!(url_error(""));
    }

    #[test]
    fn test_rejects_dangerous_schemes() {
        assert!(url_error("javascript:alert(1)"));
        assert!(url_error("data:text/html,hi"));
        assert!(url_error("file:///etc/passwd"));
        assert!(url_error("ftp://example.com"));
    }

    #[test]
    fn test_rejects_url_over_limit() {
        let long = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        assert!(parse_http_url(&long).unwrap_err().contains("at most"));
    }

    #[test]
    fn test_limit_applies_to_encoded_form() {
        // Each `é` is two bytes raw and six once percent-encoded.
        let path = "é".repeat(MAX_URL_LENGTH / 4);
        let input = format!("https://example.com/{path}");
        assert!(input.len() <= MAX_URL_LENGTH);
        assert!(url_error(&input));
    }

    #[test]
    fn test_http_url_returns_header_safe_form() {
        let mut errors = FieldErrors::new();

        assert_eq!(
            errors.http_url("target_url", "https://example.com/a\nb"),
            "https://example.com/ab"
        );
        assert_eq!(
            errors.http_url("target_url", "https://example.com/a\tb"),
            "https://example.com/ab"
        );
        assert_eq!(
            errors.http_url("target_url", "https://Example.COM/café?q=ü"),
            "https://example.com/caf%C3%A9?q=%C3%BC"
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_http_url_records_problem() {
        let mut errors = FieldErrors::new();

        assert_eq!(errors.http_url("target_url", "ftp://x"), "ftp://x");
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_metadata_image_must_be_url() {
        let mut errors = FieldErrors::new();
        check_metadata(
            &mut errors,
            LinkMetadata {
                title: Some("ok".to_string()),
                description: None,
                image: Some("not-an-image-url".to_string()),
            },
        );

        let err = errors.into_result().unwrap_err();
        match err {
            AppError::Validation { details, .. } => {
                assert!(details["fields"]["metadata.image"].is_string());
                assert!(details["fields"]["metadata.title"].is_null());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_metadata_image_is_encoded() {
        let mut errors = FieldErrors::new();
        let metadata = check_metadata(
            &mut errors,
            LinkMetadata {
                image: Some("https://cdn.example.com/ünï.png".to_string()),
                ..LinkMetadata::default()
            },
        );

        assert!(errors.is_empty());
        assert_eq!(
            metadata.image.as_deref(),
            Some("https://cdn.example.com/%C3%BCn%C3%AF.png")
        );
    }

    #[test]
    fn test_metadata_title_length() {
        let mut errors = FieldErrors::new();
        check_metadata(
            &mut errors,
            LinkMetadata {
                title: Some("t".repeat(MAX_TITLE_LENGTH + 1)),
                ..LinkMetadata::default()
            },
        );
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_empty_field_errors_is_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_email() {
        assert!(email_error("admin@example.com").is_none());
        assert!(email_error("admin").is_some());
        assert!(email_error("").is_some());
    }

    #[test]
    fn test_pagination_bounds() {
        let mut errors = FieldErrors::new();
        check_pagination(&mut errors, 1, 100);
        assert!(errors.is_empty());

        check_pagination(&mut errors, 0, 101);
        let err = errors.into_result().unwrap_err();
        match err {
            AppError::Validation { details, .. } => {
                assert!(details["fields"]["page"].is_string());
                assert!(details["fields"]["limit"].is_string());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
