// src/ledger/file.rs
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{write_json_atomic, LedgerEntry, MemoryLedger, PublishLedger};

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerDocument {
    #[serde(default)]
    posted_articles: Vec<LedgerEntry>,
}

/// Set-form ledger persisted as one JSON document.
///
/// Every successful `record_published` rewrites the file before returning, so a
/// crash can only lose the confirmation that was in flight.
#[derive(Debug)]
pub struct JsonFileLedger {
    path: PathBuf,
    inner: MemoryLedger,
}

impl JsonFileLedger {
    /// Load `path`; a missing file is an empty ledger. A file that exists but
    /// cannot be read or parsed is an error, since treating it as empty would
    /// repost everything on the page.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = match tokio::fs::read_to_string(&path).await {
            Ok(s) if s.trim().is_empty() => LedgerDocument::default(),
            Ok(s) => serde_json::from_str::<LedgerDocument>(&s)
                .with_context(|| format!("parsing ledger {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LedgerDocument::default(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading ledger {}", path.display()));
            }
        };
        tracing::debug!(path = %path.display(), entries = doc.posted_articles.len(), "ledger loaded");
        Ok(Self {
            path,
            inner: MemoryLedger::with_entries(doc.posted_articles),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    async fn persist(&self) -> Result<()> {
        let doc = LedgerDocument {
            posted_articles: self.inner.entries(),
        };
        write_json_atomic(&self.path, &doc).await
    }
}

#[async_trait::async_trait]
impl PublishLedger for JsonFileLedger {
    async fn is_published(&self, url: &str) -> Result<bool> {
        Ok(self.inner.contains(url))
    }

    async fn record_published(&mut self, url: &str, at: DateTime<Utc>) -> Result<()> {
        // The entry stays in memory even if the write fails; the next
        // successful write carries it.
        if self.inner.insert(url, at) {
            self.persist().await?;
        }
        Ok(())
    }

    async fn evict_older_than(&mut self, horizon: Duration, now: DateTime<Utc>) -> Result<usize> {
        let removed = self.inner.evict(horizon, now);
        if removed > 0 {
            self.persist().await?;
        }
        Ok(removed)
    }
}
