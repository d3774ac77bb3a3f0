//! Turns a non-2xx response body into an [`ApiError`].
//!
//! Stages, first match wins:
//! 1. empty body
//! 2. the store's own `{"error": .., "message": ..}` shape
//! 3. any JSON object carrying a recognisable message field
//! 4. whatever text we can pull out of the raw body

use crate::domain::values::api_error::{ApiError, RawBody};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::LazyLock;

const MESSAGE_FIELDS: [&str; 6] = [
    "message",
    "error",
    "detail",
    "description",
    "msg",
    "error_description",
];
const CODE_FIELDS: [&str; 5] = ["code", "error_code", "type", "errorCode", "status"];

/// Stripped HTML shorter than this is used as the message.
const MAX_PLAIN_TEXT_CHARS: usize = 200;

static TITLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());
static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

#[derive(Deserialize)]
struct StoreErrorBody {
    #[serde(default, alias = "Message")]
    message: Option<String>,
    #[serde(default, alias = "Error")]
    error: Option<String>,
}

pub fn classify(status: u16, content_type: Option<&str>, body: &str) -> ApiError {
    if body.trim().is_empty() {
        return ApiError::http(status, Some("empty response body"));
    }

    if looks_like_json(body) {
        if let Some(err) = store_error(body) {
            return err;
        }
        if let Some(err) = generic_error(body, content_type) {
            return err;
        }
    }

    raw_error(status, content_type, body)
}

fn looks_like_json(body: &str) -> bool {
    body.trim_start().starts_with('{')
}

fn store_error(body: &str) -> Option<ApiError> {
    let parsed: StoreErrorBody = serde_json::from_str(body).ok()?;
    let message = parsed.message.filter(|m| !m.trim().is_empty())?;
    let code = parsed.error.filter(|c| !c.trim().is_empty());
    Some(ApiError::new(message, code))
}

fn generic_error(body: &str, content_type: Option<&str>) -> Option<ApiError> {
    let Value::Object(object) = serde_json::from_str::<Value>(body).ok()? else {
        return None;
    };

    let message = MESSAGE_FIELDS.iter().find_map(|field| {
        object
            .get(*field)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    })?;

    // The first code field present decides, even when its value is unusable.
    let code = CODE_FIELDS
        .iter()
        .find_map(|field| object.get(*field))
        .and_then(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

    let mut details = Map::new();
    details.insert("raw_content".into(), Value::String(body.to_string()));
    details.insert(
        "content_type".into(),
        Value::String(content_type.unwrap_or("application/json").to_string()),
    );
    details.insert("parsed_from".into(), Value::String("generic_json".into()));

    Some(ApiError::new(message, code).with_details(details))
}

fn raw_error(status: u16, content_type: Option<&str>, body: &str) -> ApiError {
    let text = html_title(body)
        .or_else(|| html_text(body))
        .unwrap_or_else(|| body.trim().to_string());
    ApiError::raw(
        status,
        Some(format!("HTTP {status}: {text}")),
        RawBody::new(body, content_type),
    )
}

fn html_title(body: &str) -> Option<String> {
    let title = TITLE_REGEX.captures(body)?.get(1)?.as_str().trim();
    (!title.is_empty()).then(|| collapse_whitespace(title))
}

fn html_text(body: &str) -> Option<String> {
    if !(body.contains('<') && body.contains('>')) {
        return None;
    }
    let text = collapse_whitespace(&TAG_REGEX.replace_all(body, " "));
    (!text.is_empty() && text.chars().count() < MAX_PLAIN_TEXT_CHARS).then_some(text)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
