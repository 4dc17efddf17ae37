// src/crawl/mod.rs
// =============================================================================
// This module handles the crawl.
//
// Submodules:
// - address: resolve links against their page, decide what's crawlable
// - fetch: download pages (the Fetch trait and the reqwest implementation)
// - extract: pull <a href> values out of a page, lazily
// - registry: the shared "seen it / how many times" map
// - pipeline: ties it all together with a bounded pool of workers
// - config: the knobs (concurrency, timeouts, limits)
//
// Data flow:
//   seeds -> registry -> pipeline -> fetch -> extract -> address
//         -> registry -> (first time seen?) -> pipeline -> ...
// =============================================================================

pub mod address;
mod config;
mod extract;
mod fetch;
mod pipeline;
mod registry;

// Re-export what main.rs and the report need
pub use config::{
    CrawlConfig, DEFAULT_CONCURRENCY, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
pub use fetch::HttpFetcher;
pub use pipeline::{CrawlSummary, Crawler, StopReason};
pub use registry::Page;
