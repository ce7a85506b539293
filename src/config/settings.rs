// src/config/settings.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

use crate::ingest::providers::magticom::{DEFAULT_LISTING_URL, DEFAULT_ORIGIN};

const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";

fn default_listing_url() -> String {
    DEFAULT_LISTING_URL.to_string()
}
fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_retention_days() -> u32 {
    365
}

/// Which ledger shape a deployment keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerMode {
    #[default]
    Set,
    Pointer,
}

/// Authentication secrets; kept apart from settings so they can live elsewhere.
#[derive(Clone, Serialize, Deserialize)]
pub struct Secrets {
    /// "ENV" means: read from TELEGRAM_BOT_TOKEN
    #[serde(default)]
    pub telegram_bot_token: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("telegram_bot_token_len", &self.telegram_bot_token.len())
            .finish()
    }
}

impl Secrets {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("secrets file not found at \"{}\"", path.display()))?;
        let mut s: Secrets = serde_json::from_str(&data).context("parsing secrets file")?;

        if s.telegram_bot_token.trim().eq_ignore_ascii_case("env") {
            s.telegram_bot_token = env::var(ENV_BOT_TOKEN)
                .map_err(|_| anyhow!("Missing {ENV_BOT_TOKEN} env var"))?;
        }
        s.telegram_bot_token = s.telegram_bot_token.trim().to_string();
        if s.telegram_bot_token.is_empty() {
            bail!("missing required secrets: telegram_bot_token");
        }
        Ok(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub telegram_channel_id: i64,
    #[serde(default = "default_listing_url")]
    pub listing_url: String,
    #[serde(default = "default_origin")]
    pub site_origin: String,
    /// Only repost items whose title contains this label (case-insensitive).
    #[serde(default)]
    pub campaign_filter: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default)]
    pub ledger_mode: LedgerMode,
    /// Absent: run once and exit (cron). Present: loop on this period.
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

impl Settings {
    /// Load settings from JSON or TOML (picked by extension, then by trial).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("settings file not found at \"{}\"", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_settings(&content, ext.as_str())?;
        cfg.validate()
    }

    fn validate(mut self) -> Result<Self> {
        if self.telegram_channel_id == 0 {
            bail!("missing required settings: telegram_channel_id");
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_timeout_secs();
        }
        if self.site_origin.trim().is_empty() {
            self.site_origin = default_origin();
        }
        if self.listing_url.trim().is_empty() {
            self.listing_url = default_listing_url();
        }
        if let Some(0) = self.interval_secs {
            self.interval_secs = None;
        }
        self.campaign_filter = self
            .campaign_filter
            .take()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Ok(self)
    }

    /// Channel id in the string form the Bot API accepts.
    pub fn destination(&self) -> String {
        self.telegram_channel_id.to_string()
    }
}

pub(crate) fn parse_settings(s: &str, hint_ext: &str) -> Result<Settings> {
    if hint_ext == "toml" {
        if let Ok(v) = toml::from_str::<Settings>(s) {
            return Ok(v);
        }
    }
    match serde_json::from_str::<Settings>(s) {
        Ok(v) => Ok(v),
        Err(json_err) => toml::from_str::<Settings>(s)
            .map_err(|_| anyhow!("error parsing settings file: {json_err}")),
    }
}
