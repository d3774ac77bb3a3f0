use super::error_body;
use crate::domain::values::api_error::ApiError;
use crate::domain::values::api_result::ApiResult;
use reqwest::header::CONTENT_TYPE;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::str::FromStr;

/// Sends one request and folds every outcome into an [`ApiResult`].
///
/// 2xx bodies go through `decode`; anything else is classified from the body.
/// Transport faults (connect, timeout, body read) become `INTERNAL_ERROR`
/// failures carrying the upstream status when one is known, else 500.
pub async fn execute<T, F>(request: RequestBuilder, decode: F) -> ApiResult<T>
where
    F: FnOnce(&str) -> Result<T, String>,
{
    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            let status = e.status().map(|s| s.as_u16()).unwrap_or(500);
            tracing::debug!(error = %e, "store request failed before a response");
            return ApiResult::failure(ApiError::internal(&e), status);
        }
    };

    let status = response.status();
    let code = status.as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) if status.is_success() => {
            return ApiResult::failure(ApiError::internal(&e), code);
        }
        Err(_) => String::new(),
    };

    if !status.is_success() {
        let error = error_body::classify(code, content_type.as_deref(), &body);
        tracing::debug!(status = code, error = %error, "store returned an error");
        return ApiResult::failure(error, code);
    }

    match decode(&body) {
        Ok(data) => ApiResult::success(data, code),
        Err(e) => ApiResult::failure(ApiError::decode(e), code),
    }
}

pub fn json<T: DeserializeOwned>(body: &str) -> Result<T, String> {
    serde_json::from_str(body).map_err(|e| e.to_string())
}

/// Some endpoints answer with a bare scalar, sometimes JSON-quoted
/// (`3`, `"3"`, `"0.6.3"`).
pub fn scalar<T>(body: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    let trimmed = body.trim().trim_matches('"');
    trimmed
        .parse::<T>()
        .map_err(|e| format!("'{trimmed}' is not a valid scalar: {e}"))
}

pub fn unit(_body: &str) -> Result<(), String> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_accepts_quoted_and_bare() {
        assert_eq!(scalar::<u32>("3").unwrap(), 3);
        assert_eq!(scalar::<u32>("\"3\"\n").unwrap(), 3);
        assert_eq!(scalar::<String>("\"1.0.0\"").unwrap(), "1.0.0");
        assert!(scalar::<bool>(" true ").unwrap());
    }

    #[test]
    fn test_scalar_rejects_garbage() {
        let err = scalar::<u32>("\"three\"").unwrap_err();
        assert!(err.contains("three"));
    }

    #[test]
    fn test_json_reports_serde_error() {
        let err = json::<Vec<u32>>("{").unwrap_err();
        assert!(!err.is_empty());
    }
}
