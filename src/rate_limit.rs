use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Logical quota bucket. The API groups operations into buckets that share one
/// account-level limit; exhausting one bucket must not block the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    UserLookup,
    Bookmarks,
    ConversationSearch,
    PostLookup,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::UserLookup => "users_me",
            Endpoint::Bookmarks => "bookmarks",
            Endpoint::ConversationSearch => "search",
            Endpoint::PostLookup => "tweets",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Most recently observed remaining-count/reset-instant pair for one endpoint.
/// Either half may be unknown when the server omitted the header.
#[derive(Debug, Clone, Copy, Default)]
struct QuotaSnapshot {
    remaining: Option<u32>,
    reset_at: Option<DateTime<Utc>>,
}

/// Per-endpoint quota state machine.
///
/// Tracks the latest quota headers per endpoint and computes the minimal safe
/// wait before the next call, instead of a fixed conservative delay. Endpoints
/// with no header history yet get a configurable fallback interval (the free
/// tier allows one request per 15 minutes, hence the default).
pub struct RateLimiter {
    endpoints: HashMap<Endpoint, QuotaSnapshot>,
    fallback: Duration,
    skip_next: bool,
}

pub const DEFAULT_FALLBACK: Duration = Duration::from_secs(900);

impl RateLimiter {
    pub fn new(fallback: Duration) -> Self {
        Self {
            endpoints: HashMap::new(),
            fallback,
            skip_next: false,
        }
    }

    /// Record the latest quota snapshot for `endpoint`, overwriting any prior
    /// snapshot. A response missing the reset header keeps the previously known
    /// reset instant, unless remaining is known to be restored.
    pub fn observe(
        &mut self,
        endpoint: Endpoint,
        remaining: Option<u32>,
        reset_at: Option<DateTime<Utc>>,
    ) {
        let snapshot = self.endpoints.entry(endpoint).or_default();
        if remaining.is_some() {
            snapshot.remaining = remaining;
        }
        match reset_at {
            Some(at) => snapshot.reset_at = Some(at),
            None => {
                if remaining.is_some_and(|r| r > 0) {
                    snapshot.reset_at = None;
                }
            }
        }
    }

    /// A successful token refresh opens a fresh quota window; the next single
    /// decision rides it without waiting.
    pub fn note_refreshed(&mut self) {
        self.skip_next = true;
    }

    /// Latest observed (remaining, reset) pair for an endpoint, if any.
    pub fn snapshot(&self, endpoint: Endpoint) -> Option<(Option<u32>, Option<DateTime<Utc>>)> {
        self.endpoints
            .get(&endpoint)
            .map(|s| (s.remaining, s.reset_at))
    }

    /// How long the next call to `endpoint` must wait before dispatch.
    /// `skip` is for calls known to share quota with an immediately preceding
    /// call (chained lookups in one walk).
    pub fn wait_duration(&mut self, endpoint: Endpoint, skip: bool) -> Duration {
        self.wait_duration_at(endpoint, skip, Utc::now())
    }

    fn wait_duration_at(&mut self, endpoint: Endpoint, skip: bool, now: DateTime<Utc>) -> Duration {
        if skip {
            return Duration::ZERO;
        }
        if self.skip_next {
            self.skip_next = false;
            return Duration::ZERO;
        }

        let Some(snapshot) = self.endpoints.get(&endpoint) else {
            // First call to this endpoint: no header history to reason from.
            return self.fallback;
        };

        match (snapshot.remaining, snapshot.reset_at) {
            (Some(remaining), _) if remaining > 0 => Duration::ZERO,
            (_, Some(reset_at)) => (reset_at - now).to_std().unwrap_or(Duration::ZERO),
            // Exhausted (or unknown) with no reset instant observed.
            _ => self.fallback,
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK)
    }
}
