use chrono::{DateTime, Utc};
use thiserror::Error;

/// Outcome classification for a single API call.
///
/// `Auth` and `Permission` are fatal to the current operation; `NotFound` and
/// `QuotaExhausted` inform fallback decisions upstream and are recoverable.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limit quota exhausted")]
    QuotaExhausted {
        /// Absolute instant the quota window resets, when the server said so.
        resume_at: Option<DateTime<Utc>>,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_maps_to_malformed() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let api: ApiError = err.into();
        assert!(matches!(api, ApiError::Malformed(_)));
    }

    #[test]
    fn test_quota_exhausted_display() {
        let err = ApiError::QuotaExhausted { resume_at: None };
        assert_eq!(err.to_string(), "rate limit quota exhausted");
    }
}
