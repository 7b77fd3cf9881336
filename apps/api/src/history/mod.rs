//! History store — best-effort persistence of analysis run summaries.
//!
//! Two interchangeable backends sit behind `HistoryBackend`: a durable
//! PostgreSQL store and an append-only local JSONL file. `HistoryStore`
//! applies the write policy: primary first, one retry, then degrade to the
//! fallback. History is telemetry, not primary data — a write that fails
//! everywhere is logged and dropped, never surfaced to the run.

pub mod local;
pub mod postgres;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, warn};

use crate::models::history::HistoryEntry;

/// Storage backend for history entries. Append is the only mutation;
/// entries are never updated or deleted, so backends need no locking
/// beyond what their medium already provides.
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    async fn append(&self, entry: &HistoryEntry) -> Result<()>;

    /// Entries for one user, most recent first.
    async fn list(&self, user_id: &str, limit: usize) -> Result<Vec<HistoryEntry>>;
}

/// Where an append actually landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteDisposition {
    /// Primary backend accepted the write (possibly after the retry).
    Primary,
    /// Primary failed; the fallback backend holds the entry.
    Degraded,
    /// Both backends failed; the entry is lost and was logged.
    Dropped,
}

/// Primary/fallback pair resolved once at startup and injected everywhere
/// a run needs to record history.
pub struct HistoryStore {
    primary: Arc<dyn HistoryBackend>,
    fallback: Arc<dyn HistoryBackend>,
}

impl HistoryStore {
    pub fn new(primary: Arc<dyn HistoryBackend>, fallback: Arc<dyn HistoryBackend>) -> Self {
        Self { primary, fallback }
    }

    /// Appends with the degradation policy. Never returns an error: the
    /// disposition tells the caller (and the logs) what happened.
    pub async fn append(&self, entry: &HistoryEntry) -> WriteDisposition {
        for attempt in 0..2 {
            match self.primary.append(entry).await {
                Ok(()) => return WriteDisposition::Primary,
                Err(e) => {
                    warn!(attempt, company = %entry.company, "Primary history append failed: {e}");
                }
            }
        }

        match self.fallback.append(entry).await {
            Ok(()) => {
                warn!(company = %entry.company, "History write degraded to fallback backend");
                WriteDisposition::Degraded
            }
            Err(e) => {
                error!(company = %entry.company, "History entry dropped, fallback also failed: {e}");
                WriteDisposition::Dropped
            }
        }
    }

    /// Reads are served from the primary only; no cross-backend merge.
    pub async fn list(&self, user_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        self.primary.list(user_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory backend that fails its first `fail_first` appends.
    struct FlakyBackend {
        fail_first: usize,
        calls: AtomicUsize,
        entries: Mutex<Vec<HistoryEntry>>,
    }

    impl FlakyBackend {
        fn new(fail_first: usize) -> Self {
            Self {
                fail_first,
                calls: AtomicUsize::new(0),
                entries: Mutex::new(Vec::new()),
            }
        }

        fn stored(&self) -> usize {
            self.entries.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HistoryBackend for FlakyBackend {
        async fn append(&self, entry: &HistoryEntry) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                bail!("backend unavailable");
            }
            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }

        async fn list(&self, user_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
            let mut entries: Vec<HistoryEntry> = self
                .entries
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.user_id == user_id)
                .cloned()
                .collect();
            entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            entries.truncate(limit);
            Ok(entries)
        }
    }

    fn entry() -> HistoryEntry {
        HistoryEntry::new("user1", "Acme", "https://acme.dev/careers", 2, Some(80))
    }

    #[tokio::test]
    async fn test_append_lands_on_healthy_primary() {
        let primary = Arc::new(FlakyBackend::new(0));
        let fallback = Arc::new(FlakyBackend::new(0));
        let store = HistoryStore::new(primary.clone(), fallback.clone());

        assert_eq!(store.append(&entry()).await, WriteDisposition::Primary);
        assert_eq!(primary.stored(), 1);
        assert_eq!(fallback.stored(), 0);
    }

    #[tokio::test]
    async fn test_append_retries_primary_once() {
        let primary = Arc::new(FlakyBackend::new(1));
        let fallback = Arc::new(FlakyBackend::new(0));
        let store = HistoryStore::new(primary.clone(), fallback.clone());

        assert_eq!(store.append(&entry()).await, WriteDisposition::Primary);
        assert_eq!(primary.calls.load(Ordering::SeqCst), 2);
        assert_eq!(fallback.stored(), 0);
    }

    #[tokio::test]
    async fn test_append_degrades_to_fallback() {
        let primary = Arc::new(FlakyBackend::new(usize::MAX));
        let fallback = Arc::new(FlakyBackend::new(0));
        let store = HistoryStore::new(primary.clone(), fallback.clone());

        assert_eq!(store.append(&entry()).await, WriteDisposition::Degraded);
        assert_eq!(primary.stored(), 0);
        assert_eq!(fallback.stored(), 1);
    }

    #[tokio::test]
    async fn test_append_drops_when_both_backends_fail() {
        let primary = Arc::new(FlakyBackend::new(usize::MAX));
        let fallback = Arc::new(FlakyBackend::new(usize::MAX));
        let store = HistoryStore::new(primary, fallback);

        // Must not error or panic; the loss is logged.
        assert_eq!(store.append(&entry()).await, WriteDisposition::Dropped);
    }

    #[tokio::test]
    async fn test_list_reads_primary_only() {
        let primary = Arc::new(FlakyBackend::new(0));
        let fallback = Arc::new(FlakyBackend::new(0));
        fallback.append(&entry()).await.unwrap();
        let store = HistoryStore::new(primary, fallback);

        assert!(store.list("user1", 10).await.unwrap().is_empty());
    }
}
