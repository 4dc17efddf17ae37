// src/crawl/pipeline.rs
// =============================================================================
// This module runs the crawl itself.
//
// How it works:
// 1. Seeds are counted in the registry and put in the backlog
// 2. A dispatcher loop starts up to `concurrency` units of work at a time
// 3. Each unit fetches one page, extracts its links, resolves and filters
//    them, and counts each one in the registry
// 4. Links seen for the first time are submitted back to the dispatcher
//    through a bounded channel (a full channel makes the unit wait)
// 5. The loop ends on the shutdown signal (Ctrl-C), or by itself once there
//    is nothing queued and nothing running
//
// Why a dispatcher + backlog instead of workers reading the channel?
// - Workers also *write* to the channel
// - If every worker waited on a full channel that only workers drain, the
//   crawl would deadlock
// - The dispatcher always keeps draining the channel into the backlog, so a
//   blocked worker is only ever waiting on the dispatcher, never on itself
//
// Rust concepts:
// - JoinSet: a group of spawned tasks we can wait on (or abort) together
// - tokio::select!: wait on several things, act on whichever is ready first
// - mpsc::channel: bounded multi-producer, single-consumer queue
// =============================================================================

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use url::Url;

use super::address::{is_crawlable, normalize, resolve};
use super::config::CrawlConfig;
use super::extract::extract_links;
use super::fetch::{read_body, Fetch};
use super::registry::Registry;
use crate::error::CrawlError;

// Log a progress line every this many fetched pages
const PROGRESS_EVERY: usize = 100;

// One address waiting to be fetched
#[derive(Debug)]
struct Job {
    address: Url,
    // How many links away from a seed (seeds are 0)
    depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The shutdown signal arrived
    Interrupted,
    /// Nothing left to fetch
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub pages_fetched: usize,
    pub fetch_failures: usize,
    pub stopped: StopReason,
}

#[derive(Default)]
struct Stats {
    fetched: AtomicUsize,
    failed: AtomicUsize,
}

// The way new addresses get into the pipeline
//
// Applies the optional max_pages / max_depth limits before queuing.
#[derive(Clone)]
pub struct Submitter {
    tx: mpsc::Sender<Job>,
    scheduled: Arc<AtomicUsize>,
    max_pages: Option<usize>,
    max_depth: Option<usize>,
}

impl Submitter {
    fn new(tx: mpsc::Sender<Job>, config: &CrawlConfig) -> Self {
        Submitter {
            tx,
            scheduled: Arc::new(AtomicUsize::new(0)),
            max_pages: config.max_pages,
            max_depth: config.max_depth,
        }
    }

    // Decides if a first-sighted address may be fetched at all
    fn admit(&self, address: &Url, depth: usize) -> bool {
        if self.max_depth.is_some_and(|max| depth > max) {
            debug!(%address, depth, "not fetching, past max depth");
            return false;
        }

        let scheduled = self.scheduled.fetch_add(1, Ordering::Relaxed);
        if self.max_pages.is_some_and(|max| scheduled >= max) {
            debug!(%address, "not fetching, page limit reached");
            return false;
        }

        true
    }

    // Queues an address for fetching
    //
    // Waits while the channel is full. Returns false if the address was
    // turned away (limits) or the pipeline has stopped.
    pub async fn submit(&self, address: Url, depth: usize) -> bool {
        if !self.admit(&address, depth) {
            return false;
        }
        self.tx.send(Job { address, depth }).await.is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct Crawler {
    fetcher: Arc<dyn Fetch>,
    registry: Arc<Registry>,
    config: CrawlConfig,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn Fetch>, config: CrawlConfig) -> Self {
        Crawler {
            fetcher,
            registry: Arc::new(Registry::new(config.track_links)),
            config,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    // Crawls from the seeds until `shutdown` completes or the crawl runs dry
    //
    // When this returns, no unit of work is running any more, so the
    // registry can be snapshotted safely.
    pub async fn run<S>(&self, seeds: Vec<Url>, shutdown: S) -> CrawlSummary
    where
        S: Future<Output = ()>,
    {
        let concurrency = self.config.concurrency.max(1);
        let (tx, mut rx) = mpsc::channel(self.config.queue_capacity.max(1));
        let submitter = Submitter::new(tx, &self.config);
        let stats = Arc::new(Stats::default());

        // Seeds skip the channel: nothing is draining it yet
        let mut backlog = VecDeque::new();
        for seed in seeds {
            if self.registry.observe(&seed).first_sight && submitter.admit(&seed, 0) {
                backlog.push_back(Job {
                    address: seed,
                    depth: 0,
                });
            }
        }

        info!(seeds = backlog.len(), concurrency, "crawl started");

        let worker = Worker {
            fetcher: Arc::clone(&self.fetcher),
            registry: Arc::clone(&self.registry),
            submitter,
            stats: Arc::clone(&stats),
        };

        let mut in_flight = JoinSet::new();
        tokio::pin!(shutdown);

        let stopped = loop {
            while in_flight.len() < concurrency {
                let Some(job) = backlog.pop_front() else { break };
                in_flight.spawn(worker.clone().process(job));
            }

            if in_flight.is_empty() {
                // Every finished unit had already queued its links, so an
                // empty channel here means the crawl is exhausted
                match rx.try_recv() {
                    Ok(job) => {
                        backlog.push_back(job);
                        continue;
                    }
                    Err(_) => break StopReason::Exhausted,
                }
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break StopReason::Interrupted,
                Some(job) = rx.recv() => backlog.push_back(job),
                Some(result) = in_flight.join_next() => {
                    if let Err(e) = result {
                        warn!(error = %e, "crawl task did not finish");
                    }
                }
            }
        };

        // Stop accepting work, then abandon whatever is still running.
        // Aborting a unit drops its body stream, which closes the connection.
        rx.close();
        in_flight.shutdown().await;

        let summary = CrawlSummary {
            pages_fetched: stats.fetched.load(Ordering::Relaxed),
            fetch_failures: stats.failed.load(Ordering::Relaxed),
            stopped,
        };
        info!(
            fetched = summary.pages_fetched,
            failed = summary.fetch_failures,
            known = self.registry.len(),
            abandoned = backlog.len(),
            reason = ?summary.stopped,
            "crawl stopped"
        );
        summary
    }
}

// Everything a unit of work needs, cheap to clone into each task
#[derive(Clone)]
struct Worker {
    fetcher: Arc<dyn Fetch>,
    registry: Arc<Registry>,
    submitter: Submitter,
    stats: Arc<Stats>,
}

impl Worker {
    // Fetch -> extract -> count -> submit, for one address
    //
    // Every error stays in here: it's logged and this one address is dropped.
    async fn process(self, job: Job) {
        let Job { address, depth } = job;

        let body = match self.download(&address).await {
            Ok(body) => body,
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                debug!(error = %e, "dropping address");
                return;
            }
        };

        let fetched = self.stats.fetched.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(%address, bytes = body.len(), "fetched");
        if fetched % PROGRESS_EVERY == 0 {
            info!(fetched, known = self.registry.len(), "crawl progress");
        }

        let targets = self.discover(&address, &body);
        drop(body);

        for target in targets {
            if !self.submitter.submit(target, depth + 1).await && self.submitter.is_closed() {
                // Shutting down, nobody will fetch these anyway
                break;
            }
        }
    }

    async fn download(&self, address: &Url) -> Result<Vec<u8>, CrawlError> {
        let stream = self.fetcher.fetch(address).await?;
        read_body(address, stream).await
    }

    // Counts every crawlable link on the page and returns the ones seen for
    // the first time. Nothing in here awaits, so the page is tokenized in
    // one go on this thread.
    fn discover(&self, page: &Url, body: &[u8]) -> Vec<Url> {
        let mut links = extract_links(body);
        let mut targets = Vec::new();

        for href in links.by_ref() {
            let target = match resolve(page, &href) {
                Ok(target) => normalize(target),
                Err(e) => {
                    debug!(error = %e, "dropping link");
                    continue;
                }
            };

            if !is_crawlable(&target) {
                continue;
            }

            if self.registry.observe_link(page, &target).first_sight {
                targets.push(target);
            }
        }

        if let Some(reason) = links.error() {
            let e = CrawlError::MarkupParseError {
                address: page.to_string(),
                reason: reason.to_string(),
            };
            debug!(error = %e, "stopped extracting early");
        }

        targets
    }
}
