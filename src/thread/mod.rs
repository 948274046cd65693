pub mod reconstruct;
pub mod walker;

use crate::api::Post;

pub use reconstruct::ThreadReconstructor;
pub use walker::{ReplyChainWalker, WalkedChain};

/// How a thread was reconstructed, and how complete the result is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadSource {
    /// Conversation search found the thread in one call.
    Search,
    /// Backward reply-chain walk over single-post lookups. `reached_root` is
    /// false when the walk stopped early (depth cap, cycle, fetch failure) and
    /// the chain may be missing older ancestors.
    ChainWalk { reached_root: bool },
    /// Only the requested post itself could be fetched.
    SingleOnly,
}

/// An ordered reconstruction of a conversation, root-first, ending at the
/// originally requested post. Always holds at least one post.
#[derive(Debug, Clone)]
pub struct Thread {
    pub posts: Vec<Post>,
    pub source: ThreadSource,
    /// Both strategies failed; the thread degraded to the single requested
    /// post. Partial data is still useful downstream, so this is a flag, not
    /// an error.
    pub degraded: bool,
}

impl Thread {
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}
