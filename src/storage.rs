//! Thread persistence and processed-bookmark tracking.
//!
//! Each thread is saved twice: a JSON record with full post data and metadata,
//! and a clean markdown file. A separate JSON file tracks which post ids were
//! already reconstructed so repeated sync runs skip them.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::Post;
use crate::render;

const RECORD_VERSION: &str = "1.0";

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProcessedFile {
    #[serde(default)]
    processed_tweet_ids: Vec<String>,
    last_sync: Option<DateTime<Utc>>,
}

/// On-disk record of one reconstructed thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadRecord {
    pub tweet_id: String,
    pub conversation_id: String,
    pub author_id: String,
    pub author_username: String,
    pub tweet_count: usize,
    pub first_tweet_time: Option<DateTime<Utc>>,
    pub last_tweet_time: Option<DateTime<Utc>>,
    pub url: String,
    pub tweets: Vec<Post>,
    pub saved_at: DateTime<Utc>,
    pub version: String,
}

impl ThreadRecord {
    /// Build the record for a reconstructed thread ending at `requested_id`.
    pub fn new(posts: Vec<Post>, requested_id: &str, author_username: Option<&str>) -> Self {
        let first = posts.first();
        let last = posts.last();
        let author_username = author_username
            .map(str::to_string)
            .or_else(|| first.and_then(|p| p.author_username.clone()))
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            tweet_id: requested_id.to_string(),
            conversation_id: first
                .and_then(|p| p.conversation_id.clone())
                .unwrap_or_else(|| requested_id.to_string()),
            author_id: first
                .and_then(|p| p.author_id.clone())
                .unwrap_or_else(|| "unknown".to_string()),
            url: render::post_url(Some(&author_username), requested_id),
            author_username,
            tweet_count: posts.len(),
            first_tweet_time: first.and_then(|p| p.created_at),
            last_tweet_time: last.and_then(|p| p.created_at),
            tweets: posts,
            saved_at: Utc::now(),
            version: RECORD_VERSION.to_string(),
        }
    }
}

/// One line of `list` output.
#[derive(Debug, Clone)]
pub struct ThreadSummary {
    pub filename: String,
    pub tweet_id: String,
    pub author: String,
    pub tweet_count: usize,
    pub url: String,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StorageStats {
    pub total_threads: usize,
    pub total_processed: usize,
    pub storage_path: PathBuf,
}

pub struct ThreadStorage {
    threads_dir: PathBuf,
    processed_file: PathBuf,
    processed: HashSet<String>,
}

impl ThreadStorage {
    pub fn open(data_dir: &Path, threads_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("creating data dir {}", data_dir.display()))?;
        fs::create_dir_all(threads_dir)
            .with_context(|| format!("creating threads dir {}", threads_dir.display()))?;

        let processed_file = data_dir.join("processed_threads.json");
        let processed = match fs::read_to_string(&processed_file) {
            Ok(contents) => match serde_json::from_str::<ProcessedFile>(&contents) {
                Ok(file) => file.processed_tweet_ids.into_iter().collect(),
                Err(err) => {
                    warn!(error = %err, "processed-threads file unreadable, starting empty");
                    HashSet::new()
                }
            },
            Err(_) => HashSet::new(),
        };

        Ok(Self {
            threads_dir: threads_dir.to_path_buf(),
            processed_file,
            processed,
        })
    }

    /// Was this post already reconstructed in a prior run?
    pub fn is_processed(&self, post_id: &str) -> bool {
        self.processed.contains(post_id)
    }

    pub fn mark_processed(&mut self, post_id: &str) -> Result<()> {
        self.processed.insert(post_id.to_string());
        self.persist_processed()
    }

    fn persist_processed(&self) -> Result<()> {
        let mut ids: Vec<&String> = self.processed.iter().collect();
        ids.sort();
        let file = ProcessedFile {
            processed_tweet_ids: ids.into_iter().cloned().collect(),
            last_sync: Some(Utc::now()),
        };
        fs::write(&self.processed_file, serde_json::to_string_pretty(&file)?)
            .with_context(|| format!("writing {}", self.processed_file.display()))?;
        Ok(())
    }

    /// Save the JSON record plus the markdown rendition, and mark the post
    /// processed. Returns the JSON path.
    pub fn save_thread(&mut self, record: &ThreadRecord, markdown: &str) -> Result<PathBuf> {
        let base = format!("{}_{}", record.author_username, record.tweet_id);
        let json_path = self.threads_dir.join(format!("{base}.json"));
        let md_path = self.threads_dir.join(format!("{base}.md"));

        fs::write(&json_path, serde_json::to_string_pretty(record)?)
            .with_context(|| format!("writing {}", json_path.display()))?;
        fs::write(&md_path, markdown)
            .with_context(|| format!("writing {}", md_path.display()))?;
        debug!(path = %json_path.display(), "thread saved");

        self.mark_processed(&record.tweet_id)?;
        Ok(json_path)
    }

    /// Saved threads, newest first. Unreadable files are skipped.
    pub fn list_threads(&self) -> Vec<ThreadSummary> {
        let Ok(entries) = fs::read_dir(&self.threads_dir) else {
            return Vec::new();
        };

        let mut threads: Vec<ThreadSummary> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
            .filter_map(|entry| {
                let contents = fs::read_to_string(entry.path()).ok()?;
                let record: ThreadRecord = serde_json::from_str(&contents)
                    .map_err(|err| {
                        debug!(path = %entry.path().display(), error = %err, "skipping unreadable thread file");
                        err
                    })
                    .ok()?;
                Some(ThreadSummary {
                    filename: entry.file_name().to_string_lossy().into_owned(),
                    tweet_id: record.tweet_id,
                    author: record.author_username,
                    tweet_count: record.tweet_count,
                    url: record.url,
                    saved_at: record.saved_at,
                })
            })
            .collect();

        threads.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        threads
    }

    pub fn stats(&self) -> StorageStats {
        StorageStats {
            total_threads: self.list_threads().len(),
            total_processed: self.processed.len(),
            storage_path: self.threads_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn post(id: &str) -> Post {
        Post {
            id: id.to_string(),
            author_id: Some("42".to_string()),
            author_username: Some("someone".to_string()),
            conversation_id: Some("c1".to_string()),
            text: format!("post {id}"),
            created_at: None,
            in_reply_to: None,
        }
    }

    #[test]
    fn test_processed_ids_round_trip() {
        let dir = tempdir().unwrap();
        let threads = dir.path().join("threads");

        let mut storage = ThreadStorage::open(dir.path(), &threads).unwrap();
        assert!(!storage.is_processed("1"));
        storage.mark_processed("1").unwrap();

        let reopened = ThreadStorage::open(dir.path(), &threads).unwrap();
        assert!(reopened.is_processed("1"));
        assert!(!reopened.is_processed("2"));
    }

    #[test]
    fn test_corrupt_processed_file_starts_empty() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("processed_threads.json"), "{not json").unwrap();

        let storage = ThreadStorage::open(dir.path(), &dir.path().join("threads")).unwrap();
        assert!(!storage.is_processed("1"));
    }

    #[test]
    fn test_save_thread_writes_both_files_and_marks_processed() {
        let dir = tempdir().unwrap();
        let threads = dir.path().join("threads");
        let mut storage = ThreadStorage::open(dir.path(), &threads).unwrap();

        let record = ThreadRecord::new(vec![post("1"), post("2")], "2", Some("someone"));
        let json_path = storage.save_thread(&record, "# Thread by @someone").unwrap();

        assert_eq!(json_path, threads.join("someone_2.json"));
        assert!(threads.join("someone_2.md").exists());
        assert!(storage.is_processed("2"));

        let saved: ThreadRecord =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(saved.tweet_count, 2);
        assert_eq!(saved.url, "https://x.com/someone/status/2");
    }

    #[test]
    fn test_list_threads_newest_first() {
        let dir = tempdir().unwrap();
        let threads = dir.path().join("threads");
        let mut storage = ThreadStorage::open(dir.path(), &threads).unwrap();

        let mut old = ThreadRecord::new(vec![post("1")], "1", Some("a"));
        old.saved_at = "2025-01-01T00:00:00Z".parse().unwrap();
        let mut new = ThreadRecord::new(vec![post("2")], "2", Some("b"));
        new.saved_at = "2025-02-01T00:00:00Z".parse().unwrap();
        storage.save_thread(&old, "").unwrap();
        storage.save_thread(&new, "").unwrap();

        let listed = storage.list_threads();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].tweet_id, "2");
        assert_eq!(listed[1].tweet_id, "1");
    }

    #[test]
    fn test_stats_counts() {
        let dir = tempdir().unwrap();
        let threads = dir.path().join("threads");
        let mut storage = ThreadStorage::open(dir.path(), &threads).unwrap();

        storage.mark_processed("9").unwrap();
        let record = ThreadRecord::new(vec![post("1")], "1", None);
        storage.save_thread(&record, "").unwrap();

        let stats = storage.stats();
        assert_eq!(stats.total_threads, 1);
        assert_eq!(stats.total_processed, 2);
    }

    #[test]
    fn test_record_metadata_from_posts() {
        let mut first = post("1");
        first.created_at = Some("2025-06-01T10:00:00Z".parse().unwrap());
        let mut last = post("3");
        last.created_at = Some("2025-06-01T11:00:00Z".parse().unwrap());

        let record = ThreadRecord::new(vec![first, post("2"), last], "3", None);
        assert_eq!(record.author_username, "someone");
        assert_eq!(record.conversation_id, "c1");
        assert_eq!(record.tweet_count, 3);
        assert_eq!(
            record.first_tweet_time,
            Some("2025-06-01T10:00:00Z".parse().unwrap())
        );
        assert_eq!(
            record.last_tweet_time,
            Some("2025-06-01T11:00:00Z".parse().unwrap())
        );
    }
}
