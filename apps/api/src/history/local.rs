//! Local history backend — an append-only JSONL file.
//!
//! One entry per line. A line is written with a single `write_all`, so a
//! cancelled run either appends the whole entry or nothing. Malformed
//! lines (a crash mid-write, manual edits) are skipped on read with a
//! warning rather than failing the listing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::history::HistoryBackend;
use crate::models::history::HistoryEntry;

pub struct JsonlHistoryBackend {
    path: PathBuf,
}

impl JsonlHistoryBackend {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl HistoryBackend for JsonlHistoryBackend {
    async fn append(&self, entry: &HistoryEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }

        let mut line = serde_json::to_string(entry).context("serializing history entry")?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening {}", self.path.display()))?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn list(&self, user_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("reading {}", self.path.display())),
        };

        let mut entries: Vec<HistoryEntry> = raw
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping malformed history line: {e}");
                    None
                }
            })
            .filter(|entry: &HistoryEntry| entry.user_id == user_id)
            .collect();

        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn entry(user: &str, company: &str) -> HistoryEntry {
        HistoryEntry::new(user, company, "https://example.dev", 1, Some(50))
    }

    #[tokio::test]
    async fn test_append_then_list_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonlHistoryBackend::new(dir.path().join("history.jsonl"));

        backend.append(&entry("user1", "Acme")).await.unwrap();
        backend.append(&entry("user1", "Globex")).await.unwrap();

        let listed = backend.list("user1", 10).await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_list_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonlHistoryBackend::new(dir.path().join("nope.jsonl"));
        assert!(backend.list("user1", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_by_user_and_orders_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonlHistoryBackend::new(dir.path().join("history.jsonl"));

        let mut older = entry("user1", "Older");
        older.timestamp = Utc::now() - Duration::hours(2);
        let newer = entry("user1", "Newer");

        backend.append(&older).await.unwrap();
        backend.append(&newer).await.unwrap();
        backend.append(&entry("someone-else", "Acme")).await.unwrap();

        let listed = backend.list("user1", 10).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].company, "Newer");
        assert_eq!(listed[1].company, "Older");
    }

    #[tokio::test]
    async fn test_list_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let backend = JsonlHistoryBackend::new(&path);

        backend.append(&entry("user1", "Acme")).await.unwrap();
        tokio::fs::write(
            &path,
            format!(
                "{}not json\n",
                tokio::fs::read_to_string(&path).await.unwrap()
            ),
        )
        .await
        .unwrap();

        let listed = backend.list("user1", 10).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_list_respects_limit() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonlHistoryBackend::new(dir.path().join("history.jsonl"));
        for i in 0..5 {
            backend.append(&entry("user1", &format!("c{i}"))).await.unwrap();
        }
        assert_eq!(backend.list("user1", 3).await.unwrap().len(), 3);
    }
}
