// src/ingest/providers/magticom.rs
use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::ingest::types::{ContentSource, ListingSource};
use crate::model::{ArticleContent, ListingEntry};

pub const DEFAULT_LISTING_URL: &str = "https://www.magticom.ge/en/about-company/news";
pub const DEFAULT_ORIGIN: &str = "https://www.magticom.ge";
const USER_AGENT: &str = concat!("magti-news-reposter/", env!("CARGO_PKG_VERSION"));

static SEL_LISTING_ITEM: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".post-listing a.post-list-item").expect("static selector"));
static SEL_POST_DATE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".post-date").expect("static selector"));
static SEL_POST_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".post-content").expect("static selector"));
static SEL_ARTICLE_DATE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#article > article > div > div").expect("static selector"));
static SEL_ARTICLE_SECTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#article > article > div > section").expect("static selector"));

/// Listing + content source for the Magticom news page.
pub struct MagticomSource {
    mode: Mode,
}

enum Mode {
    // In-memory pages keyed by absolute URL, for tests and offline previews.
    Fixture {
        listing: String,
        pages: HashMap<String, String>,
    },
    Http {
        listing_url: String,
        client: reqwest::Client,
    },
}

impl MagticomSource {
    pub fn from_fixture(listing_html: &str) -> Self {
        Self {
            mode: Mode::Fixture {
                listing: listing_html.to_string(),
                pages: HashMap::new(),
            },
        }
    }

    /// Register an article page for fixture mode. No-op in HTTP mode.
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        if let Mode::Fixture { pages, .. } = &mut self.mode {
            pages.insert(url.to_string(), html.to_string());
        }
        self
    }

    pub fn from_url(listing_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("building http client")?;
        Ok(Self {
            mode: Mode::Http {
                listing_url: listing_url.to_string(),
                client,
            },
        })
    }

    async fn get_page(&self, url: &str) -> Result<String> {
        match &self.mode {
            Mode::Fixture { pages, .. } => pages
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow!("no fixture page for {url}")),
            Mode::Http { client, .. } => {
                let resp = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("GET {url}"))?;
                let status = resp.status();
                if !status.is_success() {
                    bail!("bad status code: {} ({url})", status.as_u16());
                }
                resp.text().await.context("reading response body")
            }
        }
    }

    /// Rows under `.post-listing`, in page order. Anchors without `href` are skipped.
    pub fn parse_listing(html: &str) -> Vec<ListingEntry> {
        let doc = Html::parse_document(html);
        doc.select(&SEL_LISTING_ITEM)
            .filter_map(|a| {
                let link = a.value().attr("href")?.trim();
                if link.is_empty() {
                    return None;
                }
                let date = a
                    .select(&SEL_POST_DATE)
                    .flat_map(|d| d.text())
                    .collect::<String>();
                let title = a
                    .select(&SEL_POST_TITLE)
                    .flat_map(|t| t.text())
                    .collect::<String>();
                Some(ListingEntry {
                    title: title.trim().to_string(),
                    link: link.to_string(),
                    date: date.trim().to_string(),
                })
            })
            .collect()
    }

    /// Dateline text and raw section HTML of an article page.
    pub fn parse_article(html: &str) -> ArticleContent {
        let doc = Html::parse_document(html);
        let body = doc
            .select(&SEL_ARTICLE_DATE)
            .flat_map(|d| d.text())
            .collect::<String>();
        let raw_html = doc
            .select(&SEL_ARTICLE_SECTION)
            .next()
            .map(|s| s.inner_html())
            .unwrap_or_default();
        ArticleContent {
            body: body.trim().to_string(),
            raw_html,
        }
    }
}

#[async_trait]
impl ListingSource for MagticomSource {
    async fn fetch_listing(&self) -> Result<Vec<ListingEntry>> {
        let html = match &self.mode {
            Mode::Fixture { listing, .. } => listing.clone(),
            Mode::Http { listing_url, .. } => {
                self.get_page(listing_url).await.context("fetching news page")?
            }
        };
        Ok(Self::parse_listing(&html))
    }

    fn name(&self) -> &'static str {
        "Magticom"
    }
}

#[async_trait]
impl ContentSource for MagticomSource {
    async fn fetch_content(&self, url: &str) -> Result<ArticleContent> {
        let html = self.get_page(url).await?;
        Ok(Self::parse_article(&html))
    }
}
