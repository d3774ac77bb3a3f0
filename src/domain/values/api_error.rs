use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

pub const DEFAULT_ERROR_MESSAGE: &str = "Unknown error";
pub const INTERNAL_ERROR_CODE: &str = "INTERNAL_ERROR";
pub const DECODE_ERROR_CODE: &str = "DECODE_ERROR";

/// Upper bound (in characters) for messages built from unparsed bodies.
pub const MAX_RAW_MESSAGE_CHARS: usize = 500;
pub const TRUNCATION_SUFFIX: &str = "...";

/// An error reported by the remote store, or produced while talking to it.
///
/// `raw` is only set when the body could not be understood structurally;
/// in that case `message` is a best-effort summary of the content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    pub message: String,
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawBody>,
}

/// The untouched body behind a raw error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawBody {
    pub content: String,
    pub content_type: String,
    pub is_json: bool,
}

impl RawBody {
    pub fn new(content: impl Into<String>, content_type: Option<&str>) -> Self {
        let content = content.into();
        let is_json = looks_like_json(&content);
        Self {
            content,
            content_type: content_type
                .filter(|ct| !ct.is_empty())
                .unwrap_or("unknown")
                .to_string(),
            is_json,
        }
    }
}

impl ApiError {
    pub fn new(message: impl Into<String>, code: Option<String>) -> Self {
        let message = message.into();
        Self {
            message: if message.trim().is_empty() {
                DEFAULT_ERROR_MESSAGE.to_string()
            } else {
                message
            },
            code,
            details: None,
            raw: None,
        }
    }

    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details = Some(details);
        self
    }

    /// A fault on our side of the wire: socket errors, timeouts, bugs.
    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(
            format!("Internal error: {err}"),
            Some(INTERNAL_ERROR_CODE.to_string()),
        )
    }

    /// A success status whose body did not match the expected shape.
    pub fn decode(err: impl fmt::Display) -> Self {
        Self::new(
            format!("Could not decode response: {err}"),
            Some(DECODE_ERROR_CODE.to_string()),
        )
    }

    pub fn http(status: u16, content: Option<&str>) -> Self {
        Self::new(
            format!("HTTP {status}: {}", content.unwrap_or(DEFAULT_ERROR_MESSAGE)),
            Some(http_code(status)),
        )
    }

    /// Builds a raw error. The message is bounded regardless of what the
    /// caller extracted from the body.
    pub fn raw(status: u16, message: Option<String>, body: RawBody) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("HTTP {status}"));
        Self {
            message: bound_message(&message),
            code: Some(http_code(status)),
            details: None,
            raw: Some(body),
        }
    }

    pub fn is_raw(&self) -> bool {
        self.raw.is_some()
    }

    /// Whether the store rejected a create because the resource is already
    /// there. The store exposes no dedicated signal, so this is a text match.
    pub fn is_conflict(&self) -> bool {
        self.message.to_lowercase().contains("already exists")
            || self.message.contains("Conflict")
            || self.code.as_deref() == Some("HTTP_409")
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({code})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

pub fn http_code(status: u16) -> String {
    format!("HTTP_{status}")
}

/// Truncates to [`MAX_RAW_MESSAGE_CHARS`] characters plus the suffix.
pub fn bound_message(message: &str) -> String {
    if message.chars().count() <= MAX_RAW_MESSAGE_CHARS {
        return message.to_string();
    }
    let mut bounded: String = message.chars().take(MAX_RAW_MESSAGE_CHARS).collect();
    bounded.push_str(TRUNCATION_SUFFIX);
    bounded
}

fn looks_like_json(content: &str) -> bool {
    let trimmed = content.trim();
    (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_message_gets_default() {
        let err = ApiError::new("   ", None);
        assert_eq!(err.message, DEFAULT_ERROR_MESSAGE);
    }

    #[test]
    fn test_bound_message_respects_limit() {
        let long = "x".repeat(2_000);
        let bounded = bound_message(&long);
        assert_eq!(
            bounded.chars().count(),
            MAX_RAW_MESSAGE_CHARS + TRUNCATION_SUFFIX.len()
        );
        assert!(bounded.ends_with(TRUNCATION_SUFFIX));

        let short = "short body";
        assert_eq!(bound_message(short), short);
    }

    #[test]
    fn test_bound_message_is_char_safe() {
        let long = "é".repeat(600);
        let bounded = bound_message(&long);
        assert_eq!(bounded.chars().count(), MAX_RAW_MESSAGE_CHARS + 3);
    }

    #[test]
    fn test_raw_body_detects_json() {
        assert!(RawBody::new("{\"a\":1}", None).is_json);
        assert!(RawBody::new(" [1,2] ", None).is_json);
        assert!(!RawBody::new("<html></html>", Some("text/html")).is_json);
        assert_eq!(RawBody::new("x", None).content_type, "unknown");
    }

    #[test]
    fn test_conflict_detection() {
        assert!(ApiError::new("Tenant default already exists", None).is_conflict());
        assert!(ApiError::new("Conflict", None).is_conflict());
        assert!(ApiError::new("boom", Some("HTTP_409".into())).is_conflict());
        assert!(!ApiError::new("permission denied", Some("HTTP_403".into())).is_conflict());
    }
}
