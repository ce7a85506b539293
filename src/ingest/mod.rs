// src/ingest/mod.rs
pub mod providers;
pub mod types;

use anyhow::{Context, Result};
use metrics::counter;

use crate::format::format_content;
use crate::ingest::types::{ContentSource, ListingSource};
use crate::model::{Item, ListingEntry};

/// Knobs for turning listing rows into items.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Scheme + host prefixed to relative links, e.g. `https://www.magticom.ge`.
    pub origin: String,
    /// When set, only rows whose title contains this label (case-insensitive) are kept.
    pub campaign_filter: Option<String>,
}

/// Make a possibly-relative link absolute against `origin`.
pub fn resolve_url(origin: &str, link: &str) -> String {
    let link = link.trim();
    if has_scheme(link) {
        return link.to_string();
    }
    if let Some(rest) = link.strip_prefix("//") {
        let scheme = origin.split("://").next().unwrap_or("https");
        return format!("{scheme}://{rest}");
    }
    format!(
        "{}/{}",
        origin.trim_end_matches('/'),
        link.trim_start_matches('/')
    )
}

fn has_scheme(link: &str) -> bool {
    match link.find("://") {
        Some(idx) => {
            let scheme = &link[..idx];
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

pub fn matches_campaign(entry: &ListingEntry, label: Option<&str>) -> bool {
    match label.map(str::trim) {
        None | Some("") => true,
        Some(l) => entry
            .title
            .to_lowercase()
            .contains(&l.to_lowercase()),
    }
}

/// Fetch the listing and build newest-first items.
///
/// A listing failure is returned as an error (nothing to evaluate). A failure
/// fetching one article only logs a warning; that item is still emitted with
/// empty `body`/`content`.
pub async fn extract<L, C>(listing: &L, content: &C, opts: &ExtractOptions) -> Result<Vec<Item>>
where
    L: ListingSource + ?Sized,
    C: ContentSource + ?Sized,
{
    let entries = listing
        .fetch_listing()
        .await
        .with_context(|| format!("fetching listing from {}", listing.name()))?;

    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        if !matches_campaign(&entry, opts.campaign_filter.as_deref()) {
            tracing::debug!(title = %entry.title, "skipped by campaign filter");
            continue;
        }

        let mut item = Item {
            title: entry.title.trim().to_string(),
            url: resolve_url(&opts.origin, &entry.link),
            date: entry.date.trim().to_string(),
            ..Default::default()
        };

        match content.fetch_content(&item.url).await {
            Ok(article) => {
                item.body = article.body.trim().to_string();
                item.content = format_content(&article.raw_html);
            }
            Err(e) => {
                tracing::warn!(url = %item.url, error = ?e, "couldn't fetch article content");
                counter!("repost_content_fetch_errors_total").increment(1);
            }
        }

        items.push(item);
    }

    counter!("repost_items_seen_total").increment(items.len() as u64);
    Ok(items)
}
