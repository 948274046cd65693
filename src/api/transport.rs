use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ApiResponse, Transport, QUOTA_REMAINING_HEADER, QUOTA_RESET_HEADER};
use crate::error::{ApiError, Result};

/// Production transport backed by reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("threadsync/0.1 (+https://github.com/muk2/threadsync)")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client }
    }

    async fn lower(response: reqwest::Response) -> Result<ApiResponse> {
        let status = response.status().as_u16();
        let quota_remaining = header_value(&response, QUOTA_REMAINING_HEADER)
            .and_then(|v| v.parse::<u32>().ok());
        let quota_reset = header_value(&response, QUOTA_RESET_HEADER)
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(ApiResponse {
            status,
            quota_remaining,
            quota_reset,
            body,
        })
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn header_value(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, bearer: &str, params: &[(&str, String)]) -> Result<ApiResponse> {
        let response = self
            .client
            .get(url)
            .bearer_auth(bearer)
            .query(&params)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::lower(response).await
    }

    async fn post_form(
        &self,
        url: &str,
        authorization: &str,
        form: &[(&str, &str)],
    ) -> Result<ApiResponse> {
        let response = self
            .client
            .post(url)
            .header("Authorization", authorization)
            .form(&form)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::lower(response).await
    }
}
