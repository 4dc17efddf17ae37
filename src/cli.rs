// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap is a popular Rust library for parsing command-line arguments.
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// There's no config file: these flags are the whole configuration. They're
// turned into a CrawlConfig (src/crawl/config.rs) before the crawl starts.
// =============================================================================

use clap::Parser;
use std::time::Duration;

use crate::crawl::{
    CrawlConfig, DEFAULT_CONCURRENCY, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
// The #[command(...)] attributes configure how the CLI behaves
#[derive(Parser, Debug)]
#[command(
    name = "link-census",
    version,
    about = "Crawl the web from one or more seeds and report the most-linked pages",
    long_about = "link-census follows every link it finds, fetching each page at most once, \
                  and counts how many times each page is linked to. Press Ctrl-C to stop \
                  the crawl and print the most-linked pages."
)]
pub struct Cli {
    /// Address(es) to start crawling from (e.g., https://example.com)
    ///
    /// At least one is required. They must be absolute http or https URLs.
    #[arg(required = true, value_name = "SEED")]
    pub seeds: Vec<String>,

    /// How many of the most-linked pages to print
    #[arg(short = 'n', long, default_value_t = 10)]
    pub top: usize,

    /// Maximum number of pages fetched at the same time
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// How many discovered addresses may wait in the submission queue before
    /// the pages that found them have to wait too
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Seconds allowed for establishing a connection
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout: u64,

    /// Seconds allowed for a whole request, body included
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    pub request_timeout: u64,

    /// Stop fetching new pages after this many (the crawl is unbounded otherwise)
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Don't fetch pages more than this many links away from a seed
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Keep track of which page links to which, and include it in --json output
    #[arg(long)]
    pub links: bool,

    /// Output results in JSON format instead of plain lines
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig {
            concurrency: self.concurrency,
            queue_capacity: self.queue_capacity,
            connect_timeout: Duration::from_secs(self.connect_timeout),
            request_timeout: Duration::from_secs(self.request_timeout),
            max_pages: self.max_pages,
            max_depth: self.max_depth,
            track_links: self.links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["link-census", "https://example.com"]).unwrap();
        assert_eq!(cli.seeds, vec!["https://example.com"]);
        assert_eq!(cli.top, 10);
        assert!(!cli.json);

        let config = cli.crawl_config();
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.max_pages, None);
        assert!(!config.track_links);
    }

    #[test]
    fn test_seed_is_required() {
        let err = Cli::try_parse_from(["link-census"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_all_options() {
        let cli = Cli::try_parse_from([
            "link-census",
            "-n",
            "100",
            "--concurrency",
            "4",
            "--max-pages",
            "500",
            "--max-depth",
            "3",
            "--links",
            "--json",
            "https://a.example",
            "https://b.example",
        ])
        .unwrap();

        assert_eq!(cli.seeds.len(), 2);
        assert_eq!(cli.top, 100);

        let config = cli.crawl_config();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.max_pages, Some(500));
        assert_eq!(config.max_depth, Some(3));
        assert!(config.track_links);
    }
}
