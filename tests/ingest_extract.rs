// tests/ingest_extract.rs
use anyhow::{bail, Result};
use magti_news_reposter::ingest::providers::magticom::{MagticomSource, DEFAULT_ORIGIN};
use magti_news_reposter::ingest::types::{ContentSource, ListingSource};
use magti_news_reposter::ingest::{extract, ExtractOptions};
use magti_news_reposter::model::{ArticleContent, ListingEntry};

const OCT: &str = "https://www.magticom.ge/en/about-company/news/wonder-days-october";
const ROAMING: &str = "https://www.magticom.ge/en/about-company/news/roaming-update";
const SEP: &str = "https://www.magticom.ge/en/about-company/news/wonder-days-september";

fn opts(filter: Option<&str>) -> ExtractOptions {
    ExtractOptions {
        origin: DEFAULT_ORIGIN.to_string(),
        campaign_filter: filter.map(str::to_string),
    }
}

fn fixture_source() -> MagticomSource {
    MagticomSource::from_fixture(include_str!("fixtures/news_listing.html"))
        .with_page(OCT, include_str!("fixtures/article_wonder_october.html"))
        .with_page(ROAMING, include_str!("fixtures/article_roaming.html"))
    // SEP page intentionally missing: content fetch fails for it.
}

#[tokio::test]
async fn items_keep_listing_order_with_absolute_urls() {
    let src = fixture_source();
    let items = extract(&src, &src, &opts(None)).await.unwrap();

    let urls: Vec<&str> = items.iter().map(|i| i.url.as_str()).collect();
    assert_eq!(urls, vec![OCT, ROAMING, SEP]);
    assert_eq!(items[0].title, "Wonder Days: October offers");
    assert_eq!(items[0].date, "17.10.2025");
    assert_eq!(items[0].body, "17 October 2025");
    assert!(items[0].content.starts_with("Wonder Days are back!"));
    assert_eq!(items[1].content, "New roaming packages are available.");
}

#[tokio::test]
async fn failed_content_fetch_still_emits_item() {
    let src = fixture_source();
    let items = extract(&src, &src, &opts(None)).await.unwrap();
    let sep = items.iter().find(|i| i.url == SEP).unwrap();
    assert!(sep.body.is_empty());
    assert!(sep.content.is_empty());
    assert_eq!(sep.title, "Wonder Days: September offers");
}

#[tokio::test]
async fn campaign_filter_keeps_matching_titles_only() {
    let src = fixture_source();
    let items = extract(&src, &src, &opts(Some("wonder days"))).await.unwrap();
    let urls: Vec<&str> = items.iter().map(|i| i.url.as_str()).collect();
    assert_eq!(urls, vec![OCT, SEP]);
}

struct DownListing;

#[async_trait::async_trait]
impl ListingSource for DownListing {
    async fn fetch_listing(&self) -> Result<Vec<ListingEntry>> {
        bail!("connection refused")
    }
    fn name(&self) -> &'static str {
        "down"
    }
}

struct NeverCalled;

#[async_trait::async_trait]
impl ContentSource for NeverCalled {
    async fn fetch_content(&self, url: &str) -> Result<ArticleContent> {
        panic!("content fetched for {url} although listing failed")
    }
}

#[tokio::test]
async fn listing_failure_is_fatal() {
    let err = extract(&DownListing, &NeverCalled, &opts(None)).await.unwrap_err();
    assert!(format!("{err:#}").contains("connection refused"));
}
