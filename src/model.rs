// src/model.rs
use serde::{Deserialize, Serialize};

/// One announcement as it will be published.
///
/// `url` is the only identity: two items with the same `url` are the same
/// announcement even if the vendor later tweaks the title or date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Item {
    pub title: String,
    pub url: String,
    pub date: String,    // vendor display string, never parsed
    pub body: String,    // dateline / caption
    pub content: String, // formatted section text
}

/// Raw listing row as returned by a `ListingSource` (link may be relative).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    pub title: String,
    pub link: String,
    pub date: String,
}

/// Per-article payload returned by a `ContentSource`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleContent {
    pub body: String,
    /// Raw inner HTML of the article section, not yet formatted.
    pub raw_html: String,
}
