// src/telemetry.rs
use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "magti_news_reposter=info,warn";

/// Install the global subscriber. `RUST_LOG` overrides the default filter;
/// `LOG_FORMAT=json` switches to JSON lines. Safe to call more than once.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// One-time metrics registration.
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("repost_runs_total", "Pipeline runs started.");
        describe_counter!("repost_items_seen_total", "Items extracted from the listing.");
        describe_counter!("repost_published_total", "Messages confirmed by the sink.");
        describe_counter!(
            "repost_publish_failures_total",
            "Sends rejected or failed; left for the next run."
        );
        describe_counter!(
            "repost_content_fetch_errors_total",
            "Article pages that could not be fetched."
        );
        describe_counter!(
            "repost_ledger_evicted_total",
            "Ledger entries removed by retention."
        );
        describe_counter!(
            "repost_ledger_write_errors_total",
            "Deliveries whose ledger update failed."
        );
        describe_gauge!("repost_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}
