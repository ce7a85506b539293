//! # Publish Ledger
//! Durable record of which announcement URLs were already delivered.
//!
//! Set form (`PublishLedger`): `{url, posted_at}` pairs, exact-match membership,
//! lazy eviction past a retention horizon. Pointer form (`PointerLedger`): a
//! single "last published" URL kept for older deployments.
//!
//! Writers are not synchronised. Callers must not run two dispatches against
//! the same store at once.

pub mod file;
pub mod pointer;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub use file::JsonFileLedger;
pub use pointer::PointerLedger;

/// Default retention horizon (one year).
pub fn default_retention() -> Duration {
    Duration::days(365)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub url: String,
    pub posted_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait PublishLedger: Send + Sync {
    /// Exact match on `url`. An empty store answers `false`.
    async fn is_published(&self, url: &str) -> Result<bool>;

    /// Remember `url` as delivered at `at`. Recording a known URL is a no-op.
    async fn record_published(&mut self, url: &str, at: DateTime<Utc>) -> Result<()>;

    /// Drop entries with `posted_at < now - horizon`; returns how many were removed.
    async fn evict_older_than(&mut self, horizon: Duration, now: DateTime<Utc>) -> Result<usize>;
}

/// Non-persistent ledger; also the reference behaviour for the file-backed one.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    entries: BTreeMap<String, DateTime<Utc>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = LedgerEntry>,
    {
        Self {
            entries: entries.into_iter().map(|e| (e.url, e.posted_at)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.entries
            .iter()
            .map(|(url, at)| LedgerEntry {
                url: url.clone(),
                posted_at: *at,
            })
            .collect()
    }

    /// Returns `true` when `url` was not known before.
    fn insert(&mut self, url: &str, at: DateTime<Utc>) -> bool {
        if self.entries.contains_key(url) {
            return false;
        }
        self.entries.insert(url.to_string(), at);
        true
    }

    fn evict(&mut self, horizon: Duration, now: DateTime<Utc>) -> usize {
        let cutoff = now - horizon;
        let before = self.entries.len();
        self.entries.retain(|_, at| *at >= cutoff);
        before - self.entries.len()
    }
}

#[async_trait::async_trait]
impl PublishLedger for MemoryLedger {
    async fn is_published(&self, url: &str) -> Result<bool> {
        Ok(self.contains(url))
    }

    async fn record_published(&mut self, url: &str, at: DateTime<Utc>) -> Result<()> {
        self.insert(url, at);
        Ok(())
    }

    async fn evict_older_than(&mut self, horizon: Duration, now: DateTime<Utc>) -> Result<usize> {
        Ok(self.evict(horizon, now))
    }
}

/// Write `value` as pretty JSON next to `path` and rename it into place.
pub(crate) async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    let data = serde_json::to_vec_pretty(value).context("serializing ledger")?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, data)
        .await
        .with_context(|| format!("writing {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn empty_store_answers_false() {
        let l = MemoryLedger::new();
        assert!(!l.is_published("https://a").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_record_keeps_first_entry() {
        let mut l = MemoryLedger::new();
        l.record_published("https://a", t(2025, 1, 1)).await.unwrap();
        l.record_published("https://a", t(2025, 6, 1)).await.unwrap();
        assert_eq!(l.len(), 1);
        assert_eq!(l.entries()[0].posted_at, t(2025, 1, 1));
    }

    #[tokio::test]
    async fn eviction_uses_strict_cutoff() {
        let now = t(2025, 6, 1);
        let mut l = MemoryLedger::with_entries([
            LedgerEntry {
                url: "old".into(),
                posted_at: now - Duration::days(400),
            },
            LedgerEntry {
                url: "edge".into(),
                posted_at: now - Duration::days(365),
            },
            LedgerEntry {
                url: "fresh".into(),
                posted_at: now - Duration::days(3),
            },
        ]);
        let removed = l.evict_older_than(default_retention(), now).await.unwrap();
        assert_eq!(removed, 1);
        assert!(!l.contains("old"));
        assert!(l.contains("edge"));
        assert!(l.contains("fresh"));
    }
}
