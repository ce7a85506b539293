//! # Dispatch Orchestrator
//! Decides which listed items are new and publishes them oldest-first.
//!
//! Input is always the newest-first listing; it is never re-sorted by date.
//!
//! Set form (default): an item is new iff its URL is not in the ledger. Each
//! confirmed send is recorded before the next item is attempted; a failed send
//! is left unrecorded so the next run offers it again.
//!
//! Pointer form (older deployments): everything above the remembered URL is
//! new. When the remembered URL is no longer listed, only the newest item is
//! published and becomes the new anchor.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Serialize;

use crate::ledger::{PointerLedger, PublishLedger};
use crate::model::Item;
use crate::notify::{render_message, PublishSink};

/// What one dispatch pass did. URLs are listed in attempt order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub candidates: usize,
    pub published: Vec<String>,
    pub failed: Vec<String>,
    /// Delivered but the ledger write failed: may be posted again next run.
    pub unrecorded: Vec<String>,
    /// Pointer form only: the anchor was not found and the newest item was used.
    pub recovered: bool,
}

impl DispatchReport {
    pub fn is_noop(&self) -> bool {
        self.published.is_empty() && self.failed.is_empty()
    }
}

/// New items in listing (newest-first) order. A URL listed twice is kept
/// once, at its first (newest) position.
///
/// A ledger lookup error skips the item for this run rather than risk a
/// duplicate post.
pub async fn partition_new<'a, L>(items: &'a [Item], ledger: &L) -> Vec<&'a Item>
where
    L: PublishLedger + ?Sized,
{
    let mut fresh = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for item in items {
        if !seen.insert(item.url.as_str()) {
            tracing::debug!(url = %item.url, "duplicate listing entry skipped");
            continue;
        }
        match ledger.is_published(&item.url).await {
            Ok(true) => {}
            Ok(false) => fresh.push(item),
            Err(e) => {
                tracing::error!(url = %item.url, error = ?e, "ledger lookup failed, skipping item");
            }
        }
    }
    fresh
}

/// Set-form dispatch.
pub async fn dispatch<L, S>(
    items: &[Item],
    ledger: &mut L,
    sink: &S,
    destination: &str,
    now: DateTime<Utc>,
) -> DispatchReport
where
    L: PublishLedger + ?Sized,
    S: PublishSink + ?Sized,
{
    let fresh = partition_new(items, &*ledger).await;
    let mut report = DispatchReport {
        candidates: fresh.len(),
        ..Default::default()
    };

    if fresh.is_empty() {
        tracing::info!("nothing to publish");
        return report;
    }
    tracing::info!(count = fresh.len(), "found new items to post");

    for item in fresh.into_iter().rev() {
        if !publish_one(item, sink, destination, &mut report).await {
            continue;
        }
        if let Err(e) = ledger.record_published(&item.url, now).await {
            // Delivered, but not durable: the next run may post it again.
            tracing::warn!(url = %item.url, error = ?e, "failed to record published item; it may be reposted");
            counter!("repost_ledger_write_errors_total").increment(1);
            report.unrecorded.push(item.url.clone());
        }
    }

    report
}

/// Pointer-form dispatch.
///
/// An empty pointer (first run) publishes nothing and remembers the newest item
/// as the baseline, so everything on the page at that moment is never posted.
pub async fn dispatch_pointer<S>(
    items: &[Item],
    pointer: &mut PointerLedger,
    sink: &S,
    destination: &str,
) -> DispatchReport
where
    S: PublishSink + ?Sized,
{
    let mut report = DispatchReport::default();
    let Some(newest) = items.first() else {
        tracing::info!("listing is empty, nothing to publish");
        return report;
    };

    let Some(anchor) = pointer.get().map(str::to_string) else {
        tracing::info!(url = %newest.url, "no stored pointer, remembering newest item as baseline");
        advance_pointer(pointer, &newest.url).await;
        return report;
    };

    let (fresh, anchor_missing) = collect_above_anchor(items, &anchor);

    if !fresh.is_empty() {
        report.candidates = fresh.len();
        tracing::info!(count = fresh.len(), "found new items to post");
        for item in fresh.into_iter().rev() {
            publish_one(item, sink, destination, &mut report).await;
        }
        // Advanced even when some sends failed, so the pointer never goes stale.
        advance_pointer(pointer, &newest.url).await;
    } else if anchor_missing {
        tracing::warn!(anchor = %anchor, "stored pointer not in listing, publishing newest item only");
        report.candidates = 1;
        report.recovered = true;
        publish_one(newest, sink, destination, &mut report).await;
        advance_pointer(pointer, &newest.url).await;
    } else {
        tracing::info!("nothing to publish");
    }

    report
}

/// Items above `anchor` (newest-first) and whether the anchor was absent.
/// When absent, nothing is collected.
fn collect_above_anchor<'a>(items: &'a [Item], anchor: &str) -> (Vec<&'a Item>, bool) {
    match items.iter().position(|it| it.url == anchor) {
        Some(idx) => (items[..idx].iter().collect(), false),
        None => (Vec::new(), true),
    }
}

/// Returns whether the sink confirmed delivery; failures are logged and reported.
async fn publish_one<S>(item: &Item, sink: &S, destination: &str, report: &mut DispatchReport) -> bool
where
    S: PublishSink + ?Sized,
{
    tracing::info!(title = %item.title, url = %item.url, sink = sink.name(), "posting");
    match sink.send(destination, &render_message(item)).await {
        Ok(()) => {
            tracing::info!(url = %item.url, "successfully posted");
            counter!("repost_published_total").increment(1);
            report.published.push(item.url.clone());
            true
        }
        Err(e) => {
            tracing::error!(url = %item.url, error = ?e, "publish failed, will retry next run");
            counter!("repost_publish_failures_total").increment(1);
            report.failed.push(item.url.clone());
            false
        }
    }
}

async fn advance_pointer(pointer: &mut PointerLedger, url: &str) {
    if let Err(e) = pointer.set(url).await {
        tracing::warn!(url = %url, error = ?e, "failed to persist pointer; items may be reposted");
        counter!("repost_ledger_write_errors_total").increment(1);
    }
}
