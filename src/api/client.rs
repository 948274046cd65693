use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{ApiResponse, Post, Transport};
use crate::auth::{self, Credentials, OAuth2Tokens};
use crate::error::{ApiError, Result};
use crate::rate_limit::{Endpoint, RateLimiter};

const API_BASE: &str = "https://api.twitter.com/2";

/// Backoff before the single local retry on a throttling response.
const QUOTA_RETRY_BACKOFF: Duration = Duration::from_secs(5);
/// Pause before the single retry on a transport-level failure.
const NETWORK_RETRY_PAUSE: Duration = Duration::from_secs(1);

const TWEET_FIELDS: &str = "conversation_id,created_at,author_id,text";

/// Client for the four logical provider operations: user lookup, bookmarks
/// list, conversation search, single-post lookup.
///
/// Every call consults the rate limiter before dispatch, feeds quota headers
/// back after, and classifies the outcome. Calls are strictly sequential; the
/// per-endpoint quota map is the only shared state and is touched serially.
pub struct ApiClient<T: Transport> {
    transport: T,
    limiter: RateLimiter,
    credentials: Credentials,
    tokens: OAuth2Tokens,
    cached_user_id: Option<String>,
    tokens_rotated: bool,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(
        transport: T,
        credentials: Credentials,
        tokens: OAuth2Tokens,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            transport,
            limiter,
            credentials,
            tokens,
            cached_user_id: None,
            tokens_rotated: false,
        }
    }

    pub fn tokens(&self) -> &OAuth2Tokens {
        &self.tokens
    }

    /// Whether a refresh rotated the token pair since construction. The caller
    /// is responsible for persisting the rotated pair.
    pub fn tokens_rotated(&self) -> bool {
        self.tokens_rotated
    }

    pub fn quota_snapshot(&self, endpoint: Endpoint) -> Option<(Option<u32>, Option<DateTime<Utc>>)> {
        self.limiter.snapshot(endpoint)
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    /// The authenticated user's id, fetched once and cached for the session.
    pub async fn user_id(&mut self) -> Result<String> {
        if let Some(id) = &self.cached_user_id {
            return Ok(id.clone());
        }

        let url = format!("{API_BASE}/users/me");
        let response = self.call(Endpoint::UserLookup, &url, &[], false).await?;
        let envelope: Envelope<UserPayload> = response.json()?;
        let user = envelope
            .data
            .ok_or_else(|| ApiError::Malformed("users/me response missing data".to_string()))?;

        self.cached_user_id = Some(user.id.clone());
        Ok(user.id)
    }

    /// The user's bookmarked posts, newest first, with author usernames joined
    /// from the expansion block.
    pub async fn bookmarks(&mut self, max_results: u32) -> Result<Vec<Post>> {
        let user_id = self.user_id().await?;
        let url = format!("{API_BASE}/users/{user_id}/bookmarks");
        let params = [
            ("max_results", max_results.min(100).to_string()),
            ("tweet.fields", TWEET_FIELDS.to_string()),
            ("expansions", "author_id".to_string()),
            ("user.fields", "username".to_string()),
        ];

        let response = self.call(Endpoint::Bookmarks, &url, &params, false).await?;
        let envelope: Envelope<Vec<TweetPayload>> = response.json()?;
        let usernames = envelope.usernames();

        Ok(envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|tweet| tweet.into_post(&usernames))
            .collect())
    }

    /// All posts in `conversation_id` authored by `author_id`, oldest first.
    /// An empty result is returned as-is; the caller decides whether that
    /// means "no thread" or "outside the search window".
    pub async fn search_conversation(
        &mut self,
        conversation_id: &str,
        author_id: &str,
    ) -> Result<Vec<Post>> {
        let url = format!("{API_BASE}/tweets/search/recent");
        let params = [
            (
                "query",
                format!("conversation_id:{conversation_id} from:{author_id} -is:retweet"),
            ),
            ("max_results", "100".to_string()),
            ("tweet.fields", TWEET_FIELDS.to_string()),
            ("sort_order", "recency".to_string()),
        ];

        let response = self
            .call(Endpoint::ConversationSearch, &url, &params, false)
            .await?;
        let envelope: Envelope<Vec<TweetPayload>> = response.json()?;
        let usernames = envelope.usernames();

        let mut posts: Vec<Post> = envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|tweet| tweet.into_post(&usernames))
            .collect();
        posts.sort_by_key(|p| p.created_at);
        Ok(posts)
    }

    /// A single post by id, including its reply-to reference. `skip_rate_limit`
    /// is for calls that ride the quota window of an immediately preceding
    /// call on the same endpoint.
    pub async fn post(&mut self, id: &str, skip_rate_limit: bool) -> Result<Post> {
        let url = format!("{API_BASE}/tweets/{id}");
        let params = [
            (
                "tweet.fields",
                format!("{TWEET_FIELDS},referenced_tweets"),
            ),
            ("expansions", "author_id".to_string()),
            ("user.fields", "username".to_string()),
        ];

        let response = self
            .call(Endpoint::PostLookup, &url, &params, skip_rate_limit)
            .await?;
        let envelope: Envelope<TweetPayload> = response.json()?;
        let usernames = envelope.usernames();

        envelope
            .data
            .map(|tweet| tweet.into_post(&usernames))
            .ok_or_else(|| ApiError::NotFound(format!("post {id} not found")))
    }

    /// One rate-limited, classified call: wait, dispatch, observe headers,
    /// classify. Recovers locally from a single 401 (refresh-and-retry) and a
    /// single 429 (short backoff); everything else surfaces typed.
    async fn call(
        &mut self,
        endpoint: Endpoint,
        url: &str,
        params: &[(&str, String)],
        skip: bool,
    ) -> Result<ApiResponse> {
        let wait = self.limiter.wait_duration(endpoint, skip);
        if !wait.is_zero() {
            info!(
                endpoint = %endpoint,
                wait_secs = wait.as_secs(),
                "waiting for rate limit quota"
            );
            tokio::time::sleep(wait).await;
        }

        let mut refreshed = false;
        let mut retried_quota = false;
        loop {
            let response = self.dispatch(url, params).await?;
            self.limiter
                .observe(endpoint, response.quota_remaining, response.quota_reset);

            match response.status {
                200..=299 => return Ok(response),
                401 => {
                    if refreshed {
                        return Err(ApiError::Auth(format!(
                            "still unauthorized after token refresh: {}",
                            response.body
                        )));
                    }
                    refreshed = true;
                    info!("access token rejected, refreshing");
                    self.refresh_tokens().await?;
                    // Retry the original call once on the refreshed token.
                }
                403 => return Err(ApiError::Permission(response.body)),
                404 => return Err(ApiError::NotFound(format!("{url} returned 404"))),
                429 => {
                    // Throttled even without headers: record exhaustion so the
                    // next wait computation has something to reason from.
                    if response.quota_remaining.is_none() {
                        self.limiter.observe(endpoint, Some(0), response.quota_reset);
                    }
                    if retried_quota {
                        return Err(ApiError::QuotaExhausted {
                            resume_at: response.quota_reset,
                        });
                    }
                    retried_quota = true;
                    warn!(endpoint = %endpoint, "throttled, backing off once");
                    tokio::time::sleep(QUOTA_RETRY_BACKOFF).await;
                }
                status => {
                    return Err(ApiError::Network(format!(
                        "unexpected HTTP {status} from {url}: {}",
                        response.body
                    )))
                }
            }
        }
    }

    /// Issue the request, retrying once on a transport-level failure.
    async fn dispatch(&self, url: &str, params: &[(&str, String)]) -> Result<ApiResponse> {
        match self
            .transport
            .get(url, &self.tokens.access_token, params)
            .await
        {
            Ok(response) => Ok(response),
            Err(ApiError::Network(first)) => {
                debug!(error = %first, "transport error, retrying once");
                tokio::time::sleep(NETWORK_RETRY_PAUSE).await;
                self.transport
                    .get(url, &self.tokens.access_token, params)
                    .await
            }
            Err(other) => Err(other),
        }
    }

    async fn refresh_tokens(&mut self) -> Result<()> {
        let rotated = auth::refresh_tokens(&self.transport, &self.credentials, &self.tokens).await?;
        self.tokens = rotated;
        self.tokens_rotated = true;
        self.limiter.note_refreshed();
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<D> {
    data: Option<D>,
    includes: Option<Includes>,
}

impl<D> Envelope<D> {
    fn usernames(&self) -> HashMap<String, String> {
        self.includes
            .as_ref()
            .map(|includes| {
                includes
                    .users
                    .iter()
                    .map(|u| (u.id.clone(), u.username.clone().unwrap_or_default()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<UserPayload>,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TweetPayload {
    id: String,
    text: String,
    author_id: Option<String>,
    conversation_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
    referenced_tweets: Option<Vec<ReferencedTweet>>,
}

#[derive(Debug, Deserialize)]
struct ReferencedTweet {
    #[serde(rename = "type")]
    kind: String,
    id: String,
}

impl TweetPayload {
    fn into_post(self, usernames: &HashMap<String, String>) -> Post {
        let author_username = self
            .author_id
            .as_ref()
            .and_then(|id| usernames.get(id))
            .filter(|name| !name.is_empty())
            .cloned();
        // Only the reply edge is a chain link; quotes and retweets are not.
        let in_reply_to = self
            .referenced_tweets
            .unwrap_or_default()
            .into_iter()
            .find(|r| r.kind == "replied_to")
            .map(|r| r.id);

        Post {
            id: self.id,
            author_id: self.author_id,
            author_username,
            conversation_id: self.conversation_id,
            text: self.text,
            created_at: self.created_at,
            in_reply_to,
        }
    }
}
