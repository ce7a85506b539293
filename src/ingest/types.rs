// src/ingest/types.rs
use anyhow::Result;

use crate::model::{ArticleContent, ListingEntry};

/// Anything that can list the announcements currently on the remote page,
/// newest first.
#[async_trait::async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_listing(&self) -> Result<Vec<ListingEntry>>;
    fn name(&self) -> &'static str;
}

/// Anything that can return the body and raw section HTML of one article.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_content(&self, url: &str) -> Result<ArticleContent>;
}
