// src/ledger/pointer.rs
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::write_json_atomic;

/// On-disk shape: `{ "last_post_url": "<url>" }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PointerState {
    #[serde(default)]
    last_post_url: String,
}

/// Pointer-form ledger: one remembered URL meaning "everything newer than this
/// in the listing is unpublished". Overwrite-only, no eviction.
#[derive(Debug, Clone, Default)]
pub struct PointerLedger {
    path: Option<PathBuf>,
    last_post_url: Option<String>,
}

impl PointerLedger {
    pub fn in_memory(initial: Option<&str>) -> Self {
        Self {
            path: None,
            last_post_url: initial.filter(|u| !u.is_empty()).map(str::to_string),
        }
    }

    /// Read the pointer file. Any read or parse failure means "no prior state".
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let state = match tokio::fs::read_to_string(&path).await {
            Ok(s) => serde_json::from_str::<PointerState>(&s).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "unreadable pointer state, starting fresh");
                PointerState::default()
            }),
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %path.display(), error = %e, "pointer state read failed, starting fresh");
                }
                PointerState::default()
            }
        };
        let last = state.last_post_url.trim();
        Self {
            last_post_url: (!last.is_empty()).then(|| last.to_string()),
            path: Some(path),
        }
    }

    pub fn get(&self) -> Option<&str> {
        self.last_post_url.as_deref()
    }

    /// Replace the pointer and persist it (when file-backed).
    pub async fn set(&mut self, url: &str) -> Result<()> {
        self.last_post_url = Some(url.to_string());
        self.persist().await
    }

    /// Forget the anchor entirely.
    pub async fn reset(&mut self) -> Result<()> {
        self.last_post_url = None;
        self.persist().await
    }

    async fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let state = PointerState {
            last_post_url: self.last_post_url.clone().unwrap_or_default(),
        };
        write_json_atomic(path, &state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_load_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_post.json");

        let mut p = PointerLedger::load(&path).await;
        assert_eq!(p.get(), None);
        p.set("https://www.magticom.ge/en/news/7").await.unwrap();

        let again = PointerLedger::load(&path).await;
        assert_eq!(again.get(), Some("https://www.magticom.ge/en/news/7"));

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"last_post_url\""));
    }

    #[tokio::test]
    async fn garbage_file_means_no_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("last_post.json");
        std::fs::write(&path, "<<<").unwrap();
        assert_eq!(PointerLedger::load(&path).await.get(), None);
    }

    #[tokio::test]
    async fn reset_clears_anchor() {
        let mut p = PointerLedger::in_memory(Some("https://a"));
        p.reset().await.unwrap();
        assert_eq!(p.get(), None);
    }
}
