//! Scripted transport double for exercising the client without a network.
//!
//! The mock hands out a queued sequence of responses and records every
//! request it saw, so tests can assert on call order, params, and auth.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ApiResponse, Transport};
use crate::error::{ApiError, Result};

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub url: String,
    pub authorization: String,
    pub params: Vec<(String, String)>,
}

pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<Result<ApiResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new(responses: Vec<Result<ApiResponse>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, url: &str, authorization: &str, params: Vec<(String, String)>) {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            authorization: authorization.to_string(),
            params,
        });
    }

    fn next(&self) -> Result<ApiResponse> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no scripted response left".to_string())))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, bearer: &str, params: &[(&str, String)]) -> Result<ApiResponse> {
        let params = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        self.record(url, bearer, params);
        self.next()
    }

    async fn post_form(
        &self,
        url: &str,
        authorization: &str,
        form: &[(&str, &str)],
    ) -> Result<ApiResponse> {
        let params = form
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.record(url, authorization, params);
        self.next()
    }
}

pub(crate) fn response(status: u16, body: &str) -> ApiResponse {
    ApiResponse {
        status,
        quota_remaining: None,
        quota_reset: None,
        body: body.to_string(),
    }
}

pub(crate) fn response_with_quota(
    status: u16,
    body: &str,
    remaining: u32,
    reset: DateTime<Utc>,
) -> ApiResponse {
    ApiResponse {
        status,
        quota_remaining: Some(remaining),
        quota_reset: Some(reset),
        body: body.to_string(),
    }
}

/// JSON body for a single-post lookup response.
pub(crate) fn tweet_body(id: &str, parent: Option<&str>) -> String {
    let referenced = match parent {
        Some(parent_id) => format!(
            r#","referenced_tweets":[{{"type":"replied_to","id":"{parent_id}"}}]"#
        ),
        None => String::new(),
    };
    format!(
        r#"{{"data":{{"id":"{id}","text":"post {id}","author_id":"42","conversation_id":"c1","created_at":"2025-06-01T10:00:00.000Z"{referenced}}}}}"#
    )
}
