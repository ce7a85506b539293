// src/notify/mod.rs
pub mod telegram;

use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::model::Item;

pub use telegram::TelegramNotifier;

/// Delivers one formatted message to a named destination (a chat id).
#[async_trait::async_trait]
pub trait PublishSink: Send + Sync {
    async fn send(&self, destination: &str, text: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Plain-text chat message for one announcement.
pub fn render_message(item: &Item) -> String {
    format!(
        "📅 {}\n\n{}\n\n🔗 {}",
        item.body.trim(),
        item.content,
        item.url
    )
}

// --- Test helper ---
/// Sink that records every call; sends whose text contains one of
/// `fail_on` fail instead of being recorded.
#[derive(Default)]
pub struct RecordingSink {
    pub calls: Mutex<Vec<(String, String)>>,
    fail_on: Vec<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on<I, S>(needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: needles.into_iter().map(Into::into).collect(),
        }
    }

    /// Texts delivered so far, in call order.
    pub fn texts(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|c| c.iter().map(|(_, t)| t.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl PublishSink for RecordingSink {
    async fn send(&self, destination: &str, text: &str) -> Result<()> {
        if self.fail_on.iter().any(|n| text.contains(n.as_str())) {
            bail!("recording sink: rejected");
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((destination.to_string(), text.to_string()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
