// src/report.rs
// =============================================================================
// Turns the ranking into what the user sees on stdout.
//
// Two formats:
// - text: one line per page, "<rank>: Views <count>: <address>"
// - JSON: the same entries plus the crawl summary (and the link graph when
//   --links was given)
// =============================================================================

use anyhow::Result;
use serde::Serialize;

use crate::crawl::{CrawlSummary, Page};
use crate::rank::RankEntry;

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a CrawlSummary,
    entries: &'a [RankEntry],
    #[serde(skip_serializing_if = "Option::is_none")]
    links: Option<Vec<&'a Page>>,
}

pub fn render_text(entries: &[RankEntry]) -> String {
    entries.iter().map(|entry| format!("{}\n", entry)).collect()
}

// `pages` is only used for the link graph, pass None to leave it out
pub fn render_json(
    summary: &CrawlSummary,
    entries: &[RankEntry],
    pages: Option<&[Page]>,
) -> Result<String> {
    let links = pages.map(|pages| {
        let mut linking: Vec<&Page> = pages.iter().filter(|p| !p.links.is_empty()).collect();
        linking.sort_by(|a, b| a.address.as_str().cmp(b.address.as_str()));
        linking
    });

    let report = JsonReport {
        summary,
        entries,
        links,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
