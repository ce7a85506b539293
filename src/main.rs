//! Magticom News Reposter — binary entrypoint.
//! Loads configuration, then runs the repost pipeline once (cron) or on an
//! interval when `interval_secs` is configured.

use std::time::Duration;

use magti_news_reposter::config::{setup_instructions, AppConfig, ConfigPaths};
use magti_news_reposter::ingest::providers::magticom::MagticomSource;
use magti_news_reposter::notify::TelegramNotifier;
use magti_news_reposter::pipeline::{run_configured, run_every};
use magti_news_reposter::telemetry::init_tracing;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let paths = ConfigPaths::resolve()?;
    let app = match AppConfig::load(&paths) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = ?e, "error loading configuration");
            println!("{}", setup_instructions(&paths));
            return Ok(());
        }
    };

    let source = MagticomSource::from_url(
        &app.settings.listing_url,
        Duration::from_secs(app.settings.request_timeout_secs),
    )?;
    let sink = TelegramNotifier::new(app.secrets.telegram_bot_token.clone())
        .with_timeout(app.settings.request_timeout_secs);

    match app.settings.interval_secs {
        Some(secs) => {
            tracing::info!(interval_secs = secs, "running on interval");
            run_every(&app, &source, &sink, secs).await;
            Ok(())
        }
        None => {
            run_configured(&app, &source, &sink).await?;
            Ok(())
        }
    }
}
