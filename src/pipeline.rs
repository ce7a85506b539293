//! One repost run: listing + extraction → retention → dispatch.
//!
//! Only a failure to obtain the listing aborts a run (ledger untouched by
//! dispatch). Everything downstream degrades per item.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::time;

use crate::config::{AppConfig, LedgerMode, Settings};
use crate::dispatch::{dispatch, dispatch_pointer, DispatchReport};
use crate::ingest::types::{ContentSource, ListingSource};
use crate::ingest::{extract, ExtractOptions};
use crate::ledger::{JsonFileLedger, PointerLedger, PublishLedger};
use crate::notify::PublishSink;
use crate::telemetry::ensure_metrics_described;

/// Values one run needs, derived from settings.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub destination: String,
    pub extract: ExtractOptions,
    pub retention: Duration,
}

impl RunConfig {
    pub fn from_settings(s: &Settings) -> Self {
        Self {
            destination: s.destination(),
            extract: ExtractOptions {
                origin: s.site_origin.clone(),
                campaign_filter: s.campaign_filter.clone(),
            },
            retention: Duration::days(i64::from(s.retention_days)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub items_seen: usize,
    pub evicted: usize,
    pub report: DispatchReport,
}

/// Set-form run against any ledger. Retention runs only once the listing
/// was obtained, so a failed fetch leaves the ledger exactly as it was.
pub async fn run_once<Ls, Cs, L, S>(
    listing: &Ls,
    content: &Cs,
    ledger: &mut L,
    sink: &S,
    cfg: &RunConfig,
    now: DateTime<Utc>,
) -> Result<RunSummary>
where
    Ls: ListingSource + ?Sized,
    Cs: ContentSource + ?Sized,
    L: PublishLedger + ?Sized,
    S: PublishSink + ?Sized,
{
    ensure_metrics_described();
    counter!("repost_runs_total").increment(1);

    tracing::info!(source = listing.name(), "fetching news");
    let items = extract(listing, content, &cfg.extract)
        .await
        .context("fetching news")?;
    gauge!("repost_last_run_ts").set(now.timestamp() as f64);

    let mut summary = RunSummary {
        items_seen: items.len(),
        ..Default::default()
    };
    match ledger.evict_older_than(cfg.retention, now).await {
        Ok(0) => {}
        Ok(n) => {
            tracing::info!(removed = n, "removed old articles from ledger");
            counter!("repost_ledger_evicted_total").increment(n as u64);
            summary.evicted = n;
        }
        Err(e) => tracing::warn!(error = ?e, "error removing old articles"),
    }

    if items.is_empty() {
        tracing::info!("no news found on the page");
        return Ok(summary);
    }

    summary.report = dispatch(&items, ledger, sink, &cfg.destination, now).await;
    Ok(summary)
}

/// Pointer-form run.
pub async fn run_once_pointer<Ls, Cs, S>(
    listing: &Ls,
    content: &Cs,
    pointer: &mut PointerLedger,
    sink: &S,
    cfg: &RunConfig,
) -> Result<RunSummary>
where
    Ls: ListingSource + ?Sized,
    Cs: ContentSource + ?Sized,
    S: PublishSink + ?Sized,
{
    ensure_metrics_described();
    counter!("repost_runs_total").increment(1);

    tracing::info!(source = listing.name(), "fetching news");
    let items = extract(listing, content, &cfg.extract)
        .await
        .context("fetching news")?;
    gauge!("repost_last_run_ts").set(Utc::now().timestamp() as f64);

    let report = dispatch_pointer(&items, pointer, sink, &cfg.destination).await;
    Ok(RunSummary {
        items_seen: items.len(),
        evicted: 0,
        report,
    })
}

/// Open the configured ledger (read once per run) and execute one run.
pub async fn run_configured<Src, S>(app: &AppConfig, source: &Src, sink: &S) -> Result<RunSummary>
where
    Src: ListingSource + ContentSource,
    S: PublishSink + ?Sized,
{
    let cfg = RunConfig::from_settings(&app.settings);
    let summary = match app.settings.ledger_mode {
        LedgerMode::Set => {
            let mut ledger = JsonFileLedger::open(&app.ledger_path).await?;
            run_once(source, source, &mut ledger, sink, &cfg, Utc::now()).await?
        }
        LedgerMode::Pointer => {
            let mut pointer = PointerLedger::load(&app.ledger_path).await;
            run_once_pointer(source, source, &mut pointer, sink, &cfg).await?
        }
    };
    tracing::info!(
        seen = summary.items_seen,
        published = summary.report.published.len(),
        failed = summary.report.failed.len(),
        evicted = summary.evicted,
        "run finished"
    );
    Ok(summary)
}

/// Run on a fixed period until the process is stopped. A failed run is logged
/// and the next tick proceeds as usual.
pub async fn run_every<Src, S>(app: &AppConfig, source: &Src, sink: &S, period_secs: u64)
where
    Src: ListingSource + ContentSource,
    S: PublishSink + ?Sized,
{
    let mut ticker = time::interval(time::Duration::from_secs(period_secs.max(1)));
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(e) = run_configured(app, source, sink).await {
            tracing::error!(error = ?e, "repost run failed");
        }
    }
}
