// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod config;
pub mod dispatch;
pub mod format;
pub mod ingest;
pub mod ledger;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::dispatch::{dispatch, dispatch_pointer, DispatchReport};
pub use crate::format::format_content;
pub use crate::ledger::{JsonFileLedger, MemoryLedger, PointerLedger, PublishLedger};
pub use crate::model::{ArticleContent, Item, ListingEntry};
pub use crate::notify::{render_message, PublishSink, TelegramNotifier};
pub use crate::pipeline::{run_once, run_once_pointer, RunConfig, RunSummary};
