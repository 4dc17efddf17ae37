// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (to stderr, so stdout only carries the report)
// 2. Parse command-line arguments using clap and validate the seeds
// 3. Crawl until Ctrl-C (or until there's nothing left to crawl)
// 4. Rank the pages by how often they were linked to and print the top N
// 5. Exit with proper code (0 = success, 2 = error)
//
// Rust concepts used:
// - async/await: Because we make many network requests concurrently
// - Result<T, E>: For error handling (T = success type, E = error type)
// - Arc: Shared ownership of the fetcher between all crawl workers
// =============================================================================

// Module declarations - tells Rust about our other source files
mod cli; // src/cli.rs - command-line parsing
mod crawl; // src/crawl/ - the crawl pipeline
mod error; // src/error.rs - our error type
mod rank; // src/rank.rs - top-N selection
mod report; // src/report.rs - text and JSON output

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser; // Parser trait enables the parse() method
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use crawl::{address, Crawler, HttpFetcher};

// The #[tokio::main] attribute transforms our async main into a real main function
// It creates a tokio runtime and runs our async code inside it
#[tokio::main]
async fn main() {
    init_tracing();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // Bad seeds end up here, before any crawling happened
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr; RUST_LOG=debug shows every fetch and dropped link
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<i32> {
    // Parse command-line arguments into our Cli struct
    // clap prints usage and exits by itself when no seed was given
    let cli = Cli::parse();

    let seeds = cli
        .seeds
        .iter()
        .map(|seed| address::parse_seed(seed))
        .collect::<Result<Vec<_>, _>>()?;

    let config = cli.crawl_config();
    let fetcher = HttpFetcher::new(&config).context("failed to build the HTTP client")?;
    let crawler = Crawler::new(Arc::new(fetcher), config);

    info!("🔍 Crawling from {} seed(s), press Ctrl-C to stop", seeds.len());

    let summary = crawler.run(seeds, wait_for_interrupt()).await;

    // The crawl has fully stopped, so this snapshot won't change under us
    let registry = crawler.registry();
    if registry.is_empty() {
        warn!("no pages were discovered");
    }
    let pages = registry.snapshot();
    let entries = rank::rank(&pages, cli.top);

    if cli.json {
        let link_graph = cli.links.then_some(pages.as_slice());
        println!("{}", report::render_json(&summary, &entries, link_graph)?);
    } else {
        print!("{}", report::render_text(&entries));
    }

    Ok(0)
}

// Completes on the first Ctrl-C
async fn wait_for_interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a signal handler the crawl can still end by running dry
        warn!(error = %e, "can't listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("📊 Interrupted, preparing results");
}
