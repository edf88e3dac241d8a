use serde_json::Value;
use thiserror::Error;

/// Errors returned by `AccountClient` operations.
///
/// Server rejections carry the `detail` message from the response body, or a
/// fixed fallback when the body has none.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    AccountCreation(String),

    /// Login rejected, or no token stored for a protected call
    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    ProfileUpdate(String),

    #[error("{0}")]
    ProfileFetch(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Fieldless tag for `ApiError`, for callers that branch on the failure kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    AccountCreation,
    Authentication,
    ProfileUpdate,
    ProfileFetch,
    Transport,
    InvalidResponse,
}

impl ApiError {
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::AccountCreation(_) => ApiErrorKind::AccountCreation,
            ApiError::Authentication(_) => ApiErrorKind::Authentication,
            ApiError::ProfileUpdate(_) => ApiErrorKind::ProfileUpdate,
            ApiError::ProfileFetch(_) => ApiErrorKind::ProfileFetch,
            ApiError::Transport(_) => ApiErrorKind::Transport,
            ApiError::InvalidResponse(_) => ApiErrorKind::InvalidResponse,
        }
    }

    pub fn is_authentication(&self) -> bool {
        self.kind() == ApiErrorKind::Authentication
    }
}

/// Pull a human-readable message out of an error response body.
///
/// Accepts `{"detail": "..."}` and the validation form
/// `{"detail": [{"msg": "..."}, ...]}`. Returns `None` for anything else.
pub(crate) fn detail_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) if !detail.is_empty() => Some(detail.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}
