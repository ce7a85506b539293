// src/config/mod.rs
//! Startup configuration. Environment lookups happen here only; the pipeline
//! receives an explicit `AppConfig`.

pub mod settings;

use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;

pub use settings::{LedgerMode, Secrets, Settings};

const APP_DIR: &str = "repost_magti_news";
const SECRETS_FILE: &str = "repost_magti_news.json";
const SETTINGS_FILE: &str = "settings.json";
const SET_LEDGER_FILE: &str = "posted_articles.json";
const POINTER_LEDGER_FILE: &str = "last_post.json";

const ENV_SECRETS_PATH: &str = "SECRETS_PATH";
const ENV_SECRET_DATA_DIR: &str = "SecretDataDir";
const ENV_SETTINGS_PATH: &str = "REPOST_SETTINGS_PATH";
const ENV_DATA_DIR: &str = "REPOST_DATA_DIR";
const ENV_LEDGER_PATH: &str = "REPOST_LEDGER_PATH";

/// Where configuration and state live on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub secrets: PathBuf,
    pub settings: PathBuf,
    pub data_dir: PathBuf,
    /// Explicit ledger file; otherwise chosen from `data_dir` by ledger mode.
    pub ledger_override: Option<PathBuf>,
}

/// `%LOCALAPPDATA%` on Windows, `~/.local` elsewhere.
fn local_app_data_dir() -> Result<PathBuf> {
    let dir = if cfg!(windows) {
        dirs::data_local_dir()
    } else {
        dirs::home_dir().map(|h| h.join(".local"))
    };
    dir.ok_or_else(|| anyhow!("cannot determine local data directory"))
}

impl ConfigPaths {
    /// Resolve paths from env vars with fallbacks:
    /// - secrets: $SECRETS_PATH, $SecretDataDir/repost_magti_news.json, <local>/_sec/repost_magti_news.json
    /// - data dir: $REPOST_DATA_DIR, <local>/repost_magti_news
    /// - settings: $REPOST_SETTINGS_PATH, <data dir>/settings.json
    /// - ledger: $REPOST_LEDGER_PATH, <data dir>/posted_articles.json | last_post.json
    pub fn resolve() -> Result<Self> {
        let var = |k: &str| env::var(k).ok().filter(|v| !v.trim().is_empty());

        let data_dir = match var(ENV_DATA_DIR) {
            Some(d) => PathBuf::from(d),
            None => local_app_data_dir()?.join(APP_DIR),
        };

        let secrets = match (var(ENV_SECRETS_PATH), var(ENV_SECRET_DATA_DIR)) {
            (Some(p), _) => PathBuf::from(p),
            (None, Some(dir)) => PathBuf::from(dir).join(SECRETS_FILE),
            (None, None) => local_app_data_dir()?.join("_sec").join(SECRETS_FILE),
        };

        let settings = var(ENV_SETTINGS_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(SETTINGS_FILE));

        Ok(Self {
            secrets,
            settings,
            ledger_override: var(ENV_LEDGER_PATH).map(PathBuf::from),
            data_dir,
        })
    }

    pub fn ledger_path(&self, mode: LedgerMode) -> PathBuf {
        if let Some(p) = &self.ledger_override {
            return p.clone();
        }
        match mode {
            LedgerMode::Set => self.data_dir.join(SET_LEDGER_FILE),
            LedgerMode::Pointer => self.data_dir.join(POINTER_LEDGER_FILE),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub secrets: Secrets,
    pub settings: Settings,
    pub ledger_path: PathBuf,
}

impl AppConfig {
    pub fn load(paths: &ConfigPaths) -> Result<Self> {
        let secrets = Secrets::load_from_file(&paths.secrets)?;
        let settings = Settings::load_from_file(&paths.settings)?;
        let ledger_path = paths.ledger_path(settings.ledger_mode);
        tracing::info!(
            settings = %paths.settings.display(),
            ledger = %ledger_path.display(),
            mode = ?settings.ledger_mode,
            "configuration loaded"
        );
        Ok(Self {
            secrets,
            settings,
            ledger_path,
        })
    }
}

/// Human instructions printed when configuration is missing or invalid.
pub fn setup_instructions(paths: &ConfigPaths) -> String {
    format!(
        r#"Missing required configuration for the Magticom News Reposter.

Please create the following configuration files:

1. Secrets file (for the bot token):
   Path: {secrets}
   Format:
   {{
     "telegram_bot_token": "YOUR_TELEGRAM_BOT_TOKEN"
   }}
   To obtain, create a Telegram bot by talking to @BotFather and get the token.
   Use "ENV" as the value to read it from the TELEGRAM_BOT_TOKEN variable instead.

2. Settings file (for the channel ID):
   Path: {settings}
   Format:
   {{
     "telegram_channel_id": YOUR_CHANNEL_ID_NUMBER
   }}
   To get it, add your bot to the target channel as an administrator,
   and forward a message from the channel to @userinfobot.
   Use the 'Id' number from the 'Forwarded from chat' value (including the negative sign).
"#,
        secrets = paths.secrets.display(),
        settings = paths.settings.display(),
    )
}
