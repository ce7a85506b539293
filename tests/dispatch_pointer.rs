// tests/dispatch_pointer.rs
use magti_news_reposter::dispatch::dispatch_pointer;
use magti_news_reposter::ledger::PointerLedger;
use magti_news_reposter::model::Item;
use magti_news_reposter::notify::RecordingSink;

const CHAN: &str = "-100";

fn item(n: u32) -> Item {
    Item {
        title: format!("news {n}"),
        url: format!("https://www.magticom.ge/en/about-company/news/{n}"),
        body: format!("dateline {n}"),
        content: format!("content {n}"),
        ..Default::default()
    }
}

fn sent_urls(sink: &RecordingSink) -> Vec<String> {
    sink.texts()
        .iter()
        .map(|t| t.rsplit("🔗 ").next().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn items_above_anchor_sent_oldest_first() {
    let listing = vec![item(5), item(4), item(3), item(2)];
    let mut p = PointerLedger::in_memory(Some(&item(3).url));
    let sink = RecordingSink::new();

    let report = dispatch_pointer(&listing, &mut p, &sink, CHAN).await;

    assert_eq!(sent_urls(&sink), vec![item(4).url, item(5).url]);
    assert_eq!(p.get(), Some(item(5).url.as_str()));
    assert!(!report.recovered);
}

#[tokio::test]
async fn anchor_on_top_is_a_noop() {
    let listing = vec![item(5), item(4)];
    let mut p = PointerLedger::in_memory(Some(&item(5).url));
    let sink = RecordingSink::new();

    let report = dispatch_pointer(&listing, &mut p, &sink, CHAN).await;

    assert!(sink.texts().is_empty());
    assert!(report.is_noop());
    assert_eq!(p.get(), Some(item(5).url.as_str()));
}

#[tokio::test]
async fn missing_anchor_publishes_only_newest() {
    let listing = vec![item(9), item(8), item(7)];
    let mut p = PointerLedger::in_memory(Some("https://www.magticom.ge/en/old-layout/1"));
    let sink = RecordingSink::new();

    let report = dispatch_pointer(&listing, &mut p, &sink, CHAN).await;

    assert_eq!(sent_urls(&sink), vec![item(9).url]);
    assert!(report.recovered);
    assert_eq!(p.get(), Some(item(9).url.as_str()));
}

#[tokio::test]
async fn pointer_advances_even_when_a_send_fails() {
    let listing = vec![item(3), item(2), item(1)];
    let mut p = PointerLedger::in_memory(Some(&item(1).url));
    let sink = RecordingSink::failing_on([item(3).url]);

    let report = dispatch_pointer(&listing, &mut p, &sink, CHAN).await;

    assert_eq!(sent_urls(&sink), vec![item(2).url]);
    assert_eq!(report.failed, vec![item(3).url]);
    assert_eq!(p.get(), Some(item(3).url.as_str()));
}

#[tokio::test]
async fn first_run_seeds_baseline_without_sending() {
    let listing = vec![item(2), item(1)];
    let mut p = PointerLedger::in_memory(None);
    let sink = RecordingSink::new();

    let report = dispatch_pointer(&listing, &mut p, &sink, CHAN).await;

    assert!(sink.texts().is_empty());
    assert!(report.is_noop());
    assert_eq!(p.get(), Some(item(2).url.as_str()));
}

#[tokio::test]
async fn empty_listing_leaves_pointer_alone() {
    let mut p = PointerLedger::in_memory(Some("https://x"));
    let sink = RecordingSink::new();
    let report = dispatch_pointer(&[], &mut p, &sink, CHAN).await;
    assert!(report.is_noop());
    assert_eq!(p.get(), Some("https://x"));
}
