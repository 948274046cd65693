//! The bookmark sync pass: fetch bookmarks, reconstruct each new one's
//! thread, render and save it, and mark it processed. Per-item failures are
//! logged and skipped; they never abort the pass.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::api::{ApiClient, Post, Transport};
use crate::render;
use crate::storage::{ThreadRecord, ThreadStorage};
use crate::thread::ThreadReconstructor;

#[derive(Debug, Default, Clone, Copy)]
pub struct SyncReport {
    pub fetched: usize,
    pub already_processed: usize,
    pub saved: usize,
    pub failed: usize,
}

pub async fn sync_bookmarks<T: Transport>(
    client: &mut ApiClient<T>,
    storage: &mut ThreadStorage,
    max_results: u32,
    max_walk_depth: usize,
) -> Result<SyncReport> {
    let bookmarks = client
        .bookmarks(max_results)
        .await
        .context("fetching bookmarks")?;

    let mut report = SyncReport {
        fetched: bookmarks.len(),
        ..Default::default()
    };
    let fresh: Vec<Post> = bookmarks
        .into_iter()
        .filter(|b| !storage.is_processed(&b.id))
        .collect();
    report.already_processed = report.fetched - fresh.len();

    if fresh.is_empty() {
        info!("all bookmarks already processed");
        return Ok(report);
    }
    info!(count = fresh.len(), "new bookmarks to process");

    for bookmark in &fresh {
        match process_post(client, storage, bookmark, max_walk_depth).await {
            Ok(count) => {
                info!(post_id = %bookmark.id, posts = count, "thread saved");
                report.saved += 1;
            }
            Err(err) => {
                warn!(post_id = %bookmark.id, error = %err, "failed to process bookmark, skipping");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Reconstruct, render, and save the thread for one post. Returns the number
/// of posts in the saved thread.
pub async fn process_post<T: Transport>(
    client: &mut ApiClient<T>,
    storage: &mut ThreadStorage,
    post: &Post,
    max_walk_depth: usize,
) -> Result<usize> {
    let thread = ThreadReconstructor::new(client, max_walk_depth)
        .reconstruct(post)
        .await;
    if thread.degraded {
        warn!(post_id = %post.id, "reconstruction degraded to the single bookmarked post");
    }

    let author = post
        .author_username
        .clone()
        .or_else(|| thread.posts.first().and_then(|p| p.author_username.clone()));
    let markdown = render::to_markdown(&thread.posts, author.as_deref());
    let record = ThreadRecord::new(thread.posts, &post.id, author.as_deref());
    storage.save_thread(&record, &markdown)?;
    Ok(record.tweet_count)
}
