use super::api_error::ApiError;

/// Outcome of one call to the remote store.
///
/// Expected HTTP outcomes (including 4xx/5xx) are values of this type, never
/// panics or `Err`s. The status code is kept on both arms so callers can tell
/// transient failures from permanent ones.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult<T> {
    Success { data: T, status: u16 },
    Failure { error: ApiError, status: u16 },
}

impl<T> ApiResult<T> {
    pub fn success(data: T, status: u16) -> Self {
        ApiResult::Success { data, status }
    }

    pub fn failure(error: ApiError, status: u16) -> Self {
        ApiResult::Failure { error, status }
    }

    pub fn fail(message: impl Into<String>, status: u16, code: Option<&str>) -> Self {
        ApiResult::Failure {
            error: ApiError::new(message, code.map(str::to_string)),
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiResult::Success { .. })
    }

    pub fn status(&self) -> u16 {
        match self {
            ApiResult::Success { status, .. } | ApiResult::Failure { status, .. } => *status,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ApiResult::Success { data, .. } => Some(data),
            ApiResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            ApiResult::Success { .. } => None,
            ApiResult::Failure { error, .. } => Some(error),
        }
    }

    /// Timeouts, throttling and server-side errors are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiResult::Success { .. } => false,
            ApiResult::Failure { status, .. } => {
                matches!(*status, 408 | 429) || *status >= 500
            }
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResult<U> {
        match self {
            ApiResult::Success { data, status } => ApiResult::Success {
                data: f(data),
                status,
            },
            ApiResult::Failure { error, status } => ApiResult::Failure { error, status },
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            ApiResult::Success { data, .. } => Some(data),
            ApiResult::Failure { .. } => None,
        }
    }

    pub fn into_result(self) -> Result<T, (u16, ApiError)> {
        match self {
            ApiResult::Success { data, .. } => Ok(data),
            ApiResult::Failure { error, status } => Err((status, error)),
        }
    }
}
