use std::collections::HashSet;

use tracing::{debug, warn};

use crate::api::{ApiClient, Post, Transport};

/// Result of one backward walk: the chain root-first, ending at the post the
/// walk started from, plus whether the true thread root was reached.
#[derive(Debug, Clone)]
pub struct WalkedChain {
    pub posts: Vec<Post>,
    pub reached_root: bool,
}

/// Reconstructs a reply chain backward from a starting post, one single-post
/// lookup per ancestor. Works regardless of content age, unlike search.
///
/// The walk is a bounded iteration: it fetches at most `max_depth` ancestors
/// and treats a cycle or self-reference as a terminal condition, so it
/// terminates on any input, malformed or not. Any mid-walk failure keeps the
/// ancestors already gathered.
pub struct ReplyChainWalker<'a, T: Transport> {
    client: &'a mut ApiClient<T>,
    max_depth: usize,
}

impl<'a, T: Transport> ReplyChainWalker<'a, T> {
    pub fn new(client: &'a mut ApiClient<T>, max_depth: usize) -> Self {
        Self { client, max_depth }
    }

    pub async fn walk(self, start: Post) -> WalkedChain {
        let mut seen: HashSet<String> = HashSet::from([start.id.clone()]);
        let mut ancestors: Vec<Post> = Vec::new();
        let mut parent_ref = start.in_reply_to.clone();
        let mut reached_root = parent_ref.is_none();

        while let Some(parent_id) = parent_ref.take() {
            if ancestors.len() >= self.max_depth {
                warn!(
                    depth = self.max_depth,
                    "chain walk hit depth cap, returning partial chain"
                );
                break;
            }
            if !seen.insert(parent_id.clone()) {
                warn!(post_id = %parent_id, "cyclic reply reference, stopping walk");
                break;
            }

            // Every fetch after the first rides the quota window the first one
            // opened on this endpoint.
            let skip = !ancestors.is_empty();
            match self.client.post(&parent_id, skip).await {
                Ok(parent) => {
                    debug!(post_id = %parent.id, "fetched ancestor");
                    parent_ref = parent.in_reply_to.clone();
                    if parent_ref.is_none() {
                        reached_root = true;
                    }
                    ancestors.push(parent);
                }
                Err(err) => {
                    warn!(post_id = %parent_id, error = %err, "ancestor fetch failed, returning partial chain");
                    break;
                }
            }
        }

        let mut posts = ancestors;
        posts.reverse();
        posts.push(start);

        WalkedChain {
            posts,
            reached_root,
        }
    }
}
