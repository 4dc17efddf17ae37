// src/rank.rs
// =============================================================================
// This module picks the most-referenced pages for the final report.
//
// How it works:
// - Keep a min-heap holding the best N pages seen so far
// - The heap's top is the *worst* of those N
// - Each new page only goes in if it beats that worst one
//
// That's O(P log N) for P pages instead of O(P log P) for a full sort, which
// matters when a long crawl has seen millions of addresses and we want 10.
//
// Ordering: more views first. Equal views are ordered by address, A to Z, so
// the same registry always produces the same report.
//
// Rust concepts:
// - BinaryHeap: a max-heap; wrapping items in Reverse turns it into a min-heap
// - Ord: implementing it tells BinaryHeap what "bigger" means
// =============================================================================

use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;
use url::Url;

use crate::crawl::Page;

// One line of the final report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankEntry {
    pub rank: usize,
    pub views: u64,
    pub address: Url,
}

impl fmt::Display for RankEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: Views {}: {}", self.rank, self.views, self.address)
    }
}

// A page as the heap sees it. "Greater" means "ranks higher".
#[derive(PartialEq, Eq)]
struct Candidate<'a> {
    views: u64,
    address: &'a Url,
}

impl Ord for Candidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.views
            .cmp(&other.views)
            // Reversed on purpose: the alphabetically *smaller* address ranks higher
            .then_with(|| other.address.as_str().cmp(self.address.as_str()))
    }
}

impl PartialOrd for Candidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Returns the top_n most viewed pages, best first
//
// Always returns exactly min(top_n, pages.len()) entries, numbered from 1.
// Calling it twice on the same pages gives the same answer.
pub fn rank(pages: &[Page], top_n: usize) -> Vec<RankEntry> {
    if top_n == 0 {
        return Vec::new();
    }

    let mut heap: BinaryHeap<Reverse<Candidate>> = BinaryHeap::with_capacity(top_n + 1);

    for page in pages {
        let candidate = Candidate {
            views: page.views,
            address: &page.address,
        };

        if heap.len() < top_n {
            heap.push(Reverse(candidate));
            continue;
        }

        let beats_worst = heap
            .peek()
            .map_or(false, |Reverse(worst)| candidate > *worst);

        if beats_worst {
            heap.pop();
            heap.push(Reverse(candidate));
        }
    }

    // Ascending order of Reverse(..) is descending order of the candidates
    heap.into_sorted_vec()
        .into_iter()
        .enumerate()
        .map(|(i, Reverse(candidate))| RankEntry {
            rank: i + 1,
            views: candidate.views,
            address: candidate.address.clone(),
        })
        .collect()
}
