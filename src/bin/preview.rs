//! Prints the messages the reposter would send for the current listing,
//! newest first, and whether the local ledger already holds each one.
//! Never publishes and never writes the ledger.

use std::time::Duration;

use magti_news_reposter::config::{ConfigPaths, LedgerMode, Settings};
use magti_news_reposter::ingest::providers::magticom::{
    MagticomSource, DEFAULT_LISTING_URL, DEFAULT_ORIGIN,
};
use magti_news_reposter::ingest::{extract, ExtractOptions};
use magti_news_reposter::ledger::{JsonFileLedger, PublishLedger};
use magti_news_reposter::notify::render_message;
use magti_news_reposter::telemetry::init_tracing;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let paths = ConfigPaths::resolve()?;
    // The channel id is irrelevant here; fall back to defaults when settings are missing.
    let settings = Settings::load_from_file(&paths.settings).ok();
    let (listing_url, opts, timeout) = match &settings {
        Some(s) => (
            s.listing_url.clone(),
            ExtractOptions {
                origin: s.site_origin.clone(),
                campaign_filter: s.campaign_filter.clone(),
            },
            s.request_timeout_secs,
        ),
        None => (
            DEFAULT_LISTING_URL.to_string(),
            ExtractOptions {
                origin: DEFAULT_ORIGIN.to_string(),
                campaign_filter: None,
            },
            120,
        ),
    };

    let source = MagticomSource::from_url(&listing_url, Duration::from_secs(timeout))?;
    let items = extract(&source, &source, &opts).await?;

    let ledger = match JsonFileLedger::open(paths.ledger_path(LedgerMode::Set)).await {
        Ok(l) => Some(l),
        Err(e) => {
            tracing::warn!(error = ?e, "ledger unavailable, showing all items as new");
            None
        }
    };

    println!("{} item(s) on {}\n", items.len(), listing_url);
    for item in &items {
        let seen = match &ledger {
            Some(l) => l.is_published(&item.url).await.unwrap_or(false),
            None => false,
        };
        println!("=== {} [{}]", item.title, if seen { "published" } else { "NEW" });
        println!("{}\n", render_message(item));
    }

    println!("preview done");
    Ok(())
}
