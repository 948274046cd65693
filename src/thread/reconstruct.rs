use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use super::walker::ReplyChainWalker;
use super::{Thread, ThreadSource};
use crate::api::{ApiClient, Post, Transport};

/// The provider's recent-search index only covers this many days back.
const SEARCH_WINDOW_DAYS: i64 = 7;

/// Produces the best available thread for a requested post.
///
/// Strategy order: conversation search (one call, whole thread) when the post
/// is plausibly inside the search window, then a backward reply-chain walk,
/// then the single post alone. Partial failure never becomes an error; the
/// result carries a source marker and a degradation flag instead.
pub struct ThreadReconstructor<'a, T: Transport> {
    client: &'a mut ApiClient<T>,
    max_walk_depth: usize,
}

impl<'a, T: Transport> ThreadReconstructor<'a, T> {
    pub fn new(client: &'a mut ApiClient<T>, max_walk_depth: usize) -> Self {
        Self {
            client,
            max_walk_depth,
        }
    }

    pub async fn reconstruct(&mut self, post: &Post) -> Thread {
        if let Some(posts) = self.try_search(post).await {
            info!(post_id = %post.id, count = posts.len(), "thread found via conversation search");
            return Thread {
                posts,
                source: ThreadSource::Search,
                degraded: false,
            };
        }

        // The bookmarked payload does not carry the reply reference, so one
        // direct fetch is needed before the walk. It rides the quota window of
        // the search call that just ran (or failed fast).
        let anchor = match self.client.post(&post.id, true).await {
            Ok(anchor) => anchor,
            Err(err) => {
                warn!(post_id = %post.id, error = %err, "anchor fetch failed, degrading to bookmarked payload");
                return Thread {
                    posts: vec![post.clone()],
                    source: ThreadSource::SingleOnly,
                    degraded: true,
                };
            }
        };

        let walked = ReplyChainWalker::new(self.client, self.max_walk_depth)
            .walk(anchor)
            .await;
        info!(
            post_id = %post.id,
            count = walked.posts.len(),
            reached_root = walked.reached_root,
            "thread reconstructed via chain walk"
        );
        Thread {
            posts: walked.posts,
            source: ThreadSource::ChainWalk {
                reached_root: walked.reached_root,
            },
            degraded: false,
        }
    }

    /// Search strategy. Any shortfall — post too old, ids missing, empty
    /// result, requested post absent, provider error — uniformly means
    /// "search failed" and falls through to the chain walk.
    async fn try_search(&mut self, post: &Post) -> Option<Vec<Post>> {
        if !within_search_window(post.created_at, Utc::now()) {
            debug!(post_id = %post.id, "post older than search window, skipping search");
            return None;
        }
        let (conversation_id, author_id) = match (&post.conversation_id, &post.author_id) {
            (Some(c), Some(a)) => (c.clone(), a.clone()),
            _ => {
                debug!(post_id = %post.id, "missing conversation or author id, skipping search");
                return None;
            }
        };

        match self
            .client
            .search_conversation(&conversation_id, &author_id)
            .await
        {
            Ok(posts) => truncate_at(posts, &post.id),
            Err(err) => {
                warn!(post_id = %post.id, error = %err, "conversation search failed");
                None
            }
        }
    }
}

/// Unknown age counts as inside the window: search is the cheaper single-call
/// path and its failure falls through to the walk anyway.
fn within_search_window(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match created_at {
        Some(at) => now - at < TimeDelta::days(SEARCH_WINDOW_DAYS),
        None => true,
    }
}

/// Keep the thread up to and including the requested post. A result that does
/// not contain the requested post cannot anchor a chain, so it is discarded.
fn truncate_at(mut posts: Vec<Post>, requested_id: &str) -> Option<Vec<Post>> {
    let position = posts.iter().position(|p| p.id == requested_id)?;
    posts.truncate(position + 1);
    Some(posts)
}
