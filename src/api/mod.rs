pub mod client;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use client::ApiClient;
pub use transport::HttpTransport;

/// Quota headers the provider attaches to most responses. Either may be absent.
pub const QUOTA_REMAINING_HEADER: &str = "x-rate-limit-remaining";
pub const QUOTA_RESET_HEADER: &str = "x-rate-limit-reset";

/// A single fetched post. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_id: Option<String>,
    pub author_username: Option<String>,
    pub conversation_id: Option<String>,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Id of the post this one replies to. At most one; quote/retweet
    /// references are not chain links and are dropped on ingest.
    pub in_reply_to: Option<String>,
}

/// The slice of an HTTP response the client reasons about: status, the two
/// quota headers, and the body. Nothing else crosses the transport seam.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub quota_remaining: Option<u32>,
    pub quota_reset: Option<DateTime<Utc>>,
    pub body: String,
}

impl ApiResponse {
    pub fn json<D: serde::de::DeserializeOwned>(&self) -> Result<D> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Minimal HTTP seam. Implemented by [`HttpTransport`] for real traffic and by
/// scripted doubles in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET with bearer auth and query params.
    async fn get(&self, url: &str, bearer: &str, params: &[(&str, String)]) -> Result<ApiResponse>;

    /// Form-encoded POST with a caller-supplied Authorization header value.
    /// Used by the token refresh path, which never consumes monitored quota.
    async fn post_form(
        &self,
        url: &str,
        authorization: &str,
        form: &[(&str, &str)],
    ) -> Result<ApiResponse>;
}
