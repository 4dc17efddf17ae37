// src/crawl/config.rs
// =============================================================================
// Knobs that control a crawl.
//
// The CLI (src/cli.rs) builds one of these from the command line. Tests build
// them directly, usually starting from CrawlConfig::default().
// =============================================================================

use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 32;
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Most fetches allowed in flight at once
    pub concurrency: usize,
    /// Capacity of the submission channel; a full channel blocks submitters
    pub queue_capacity: usize,
    /// Limit on establishing a connection
    pub connect_timeout: Duration,
    /// Limit on a whole request, body included
    pub request_timeout: Duration,
    /// Stop scheduling new fetches after this many pages were scheduled
    pub max_pages: Option<usize>,
    /// Don't fetch pages more than this many links away from a seed
    pub max_depth: Option<usize>,
    /// Remember which page linked to which (the link graph)
    pub track_links: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        CrawlConfig {
            concurrency: DEFAULT_CONCURRENCY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_pages: None,
            max_depth: None,
            track_links: false,
        }
    }
}
