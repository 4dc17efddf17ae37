// src/crawl/registry.rs
// =============================================================================
// The visited registry: every address we've ever seen, and how many times.
//
// This is the one piece of state all the crawl workers share. Every change
// goes through a single mutex, so changes happen one at a time in a total
// order. That gives us the property the whole crawler relies on:
//
//   For any address, exactly one observe() call ever sees the count go
//   from 0 to 1 ("first sight"). Only that caller schedules the fetch.
//
// So no address is ever fetched twice, no matter how many pages link to it
// at the same moment.
//
// Rust concepts:
// - parking_lot::Mutex: like std's Mutex, but lock() can't be poisoned
// - HashMap entry API: find-or-insert in one lookup
// =============================================================================

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use url::Url;

// One address and everything we know about it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub address: Url,
    /// How many times this address was discovered
    pub views: u64,
    /// Addresses this page links to; only filled when link tracking is on
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub links: BTreeSet<Url>,
}

impl Page {
    fn new(address: Url) -> Self {
        Page {
            address,
            views: 0,
            links: BTreeSet::new(),
        }
    }
}

// What observe() tells its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// True for exactly one observation per address: the one that made views 1
    pub first_sight: bool,
    /// The view count right after this observation
    pub views: u64,
}

pub struct Registry {
    pages: Mutex<HashMap<Url, Page>>,
    track_links: bool,
}

impl Registry {
    pub fn new(track_links: bool) -> Self {
        Registry {
            pages: Mutex::new(HashMap::new()),
            track_links,
        }
    }

    // Counts one discovery of `address`
    //
    // Creates the page at 0 views if it's new, then adds one. The lock is
    // held for the whole read-modify-write, so concurrent callers can't both
    // see views == 1.
    pub fn observe(&self, address: &Url) -> Observation {
        let mut pages = self.pages.lock();
        Self::bump(&mut pages, address)
    }

    // Counts one discovery of `address` made on the page `source`
    //
    // With link tracking on, the edge source -> address is recorded in the
    // same critical section as the count, so the two never disagree.
    pub fn observe_link(&self, source: &Url, address: &Url) -> Observation {
        let mut pages = self.pages.lock();
        let observation = Self::bump(&mut pages, address);

        // The source was fetched, so it was observed before and is present
        if self.track_links {
            if let Some(page) = pages.get_mut(source) {
                page.links.insert(address.clone());
            }
        }

        observation
    }

    fn bump(pages: &mut HashMap<Url, Page>, address: &Url) -> Observation {
        let page = pages
            .entry(address.clone())
            .or_insert_with(|| Page::new(address.clone()));
        page.views += 1;

        Observation {
            first_sight: page.views == 1,
            views: page.views,
        }
    }

    // Copies every page out, as of right now
    //
    // Meant for shutdown, after the pipeline has stopped: the copy is
    // consistent, but anything still observing would not be in it.
    pub fn snapshot(&self) -> Vec<Page> {
        self.pages.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.pages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not an AtomicU64 per page?
//    - The map itself changes (new pages get inserted)
//    - Inserting into a HashMap needs exclusive access anyway
//    - One lock around the whole thing is simple and obviously correct
//
// 2. Why &self and not &mut self?
//    - Workers share the registry through an Arc
//    - Arc only hands out shared references
//    - The Mutex inside provides the mutability ("interior mutability")
//
// 3. Why doesn't observe() await anything?
//    - The critical section is a couple of HashMap operations
//    - Holding a lock across an .await is a classic async deadlock, so we
//      never do it
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_first_observation_is_first_sight() {
        let registry = Registry::new(false);
        let a = url("http://example.com/a");

        let first = registry.observe(&a);
        let second = registry.observe(&a);

        assert_eq!(first, Observation { first_sight: true, views: 1 });
        assert_eq!(second, Observation { first_sight: false, views: 2 });
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_observers_see_exactly_one_first_sight() {
        let registry = Arc::new(Registry::new(false));
        let a = url("http://example.com/contended");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let a = a.clone();
                std::thread::spawn(move || {
                    (0..250)
                        .filter(|_| registry.observe(&a).first_sight)
                        .count()
                })
            })
            .collect();

        let first_sights: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(first_sights, 1);
        assert_eq!(registry.snapshot()[0].views, 16 * 250);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_tasks_see_exactly_one_first_sight() {
        let registry = Arc::new(Registry::new(false));
        let mut tasks = tokio::task::JoinSet::new();

        for i in 0..64 {
            let registry = Arc::clone(&registry);
            tasks.spawn(async move {
                // Every task hits the same 8 addresses
                let a = url(&format!("http://example.com/{}", i % 8));
                registry.observe(&a).first_sight
            });
        }

        let mut first_sights = 0;
        while let Some(result) = tasks.join_next().await {
            if result.unwrap() {
                first_sights += 1;
            }
        }

        assert_eq!(first_sights, 8);
        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn test_link_tracking_records_edges() {
        let registry = Registry::new(true);
        let home = url("http://example.com/");
        let a = url("http://example.com/a");

        registry.observe(&home);
        registry.observe_link(&home, &a);
        registry.observe_link(&home, &a);

        let pages = registry.snapshot();
        let home_page = pages.iter().find(|p| p.address == home).unwrap();
        let a_page = pages.iter().find(|p| p.address == a).unwrap();

        assert_eq!(home_page.links.iter().collect::<Vec<_>>(), vec![&a]);
        assert_eq!(a_page.views, 2);
        assert!(a_page.links.is_empty());
    }

    #[test]
    fn test_link_tracking_off_keeps_no_edges() {
        let registry = Registry::new(false);
        let home = url("http://example.com/");
        let a = url("http://example.com/a");

        registry.observe(&home);
        registry.observe_link(&home, &a);

        assert!(registry.snapshot().iter().all(|p| p.links.is_empty()));
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let registry = Registry::new(false);
        let a = url("http://example.com/a");
        registry.observe(&a);

        let before = registry.snapshot();
        registry.observe(&a);

        assert_eq!(before[0].views, 1);
        assert_eq!(registry.snapshot()[0].views, 2);
    }
}
