// src/crawl/extract.rs
// =============================================================================
// This module pulls anchor links out of HTML pages.
//
// We use the `lol_html` crate which:
// - Is a streaming tokenizer (it never builds a full DOM)
// - Fires a callback for every element matching a CSS selector
// - Can be fed the page a chunk at a time
//
// extract_links() returns an iterator. Each call to next() feeds the tokenizer
// just enough of the page to find the next href, so the links come out lazily
// in document order. If the tokenizer fails part way through, the iterator
// simply ends: links already handed out stay valid.
//
// Rust concepts:
// - Iterator: implementing next() gives us for-loops, collect(), etc. for free
// - Rc<RefCell<...>>: shared, mutable state between us and the callback
// =============================================================================

use lol_html::{element, HtmlRewriter, MemorySettings, OutputSink, Settings};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

// How much of the page we hand the tokenizer per step
const CHUNK_SIZE: usize = 8 * 1024;

// Upper bound on what the tokenizer may buffer for a single page.
// A tag that never closes would otherwise grow the buffer without limit.
const MAX_TOKENIZER_MEMORY: usize = 1024 * 1024;

// We only read the page, we never write a rewritten copy anywhere
struct Discard;

impl OutputSink for Discard {
    fn handle_chunk(&mut self, _chunk: &[u8]) {}
}

// Lazy, forward-only sequence of raw href values from one page
pub struct Links<'a> {
    // None once the page is fully consumed or the tokenizer failed
    rewriter: Option<HtmlRewriter<'static, Discard>>,
    found: Rc<RefCell<VecDeque<String>>>,
    remaining: &'a [u8],
    error: Option<String>,
}

// Extracts every <a href="..."> value from a page, in order
//
// The values are returned exactly as written in the page; resolving them
// against the page address is the caller's job (see address.rs).
//
// Example:
//   body = "<a href='/docs'>Docs</a><a>no href</a>"
//   result yields "/docs"
pub fn extract_links(body: &[u8]) -> Links<'_> {
    Links::with_memory_limit(body, MAX_TOKENIZER_MEMORY)
}

impl<'a> Links<'a> {
    pub(crate) fn with_memory_limit(body: &'a [u8], limit: usize) -> Self {
        let found = Rc::new(RefCell::new(VecDeque::new()));
        let sink = Rc::clone(&found);

        let mut memory_settings = MemorySettings::default();
        memory_settings.max_allowed_memory_usage = limit;

        let rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![
                    element!("a[href]", move |el| {
                        if let Some(href) = el.get_attribute("href") {
                            sink.borrow_mut().push_back(href);
                        }
                        Ok(())
                    }),
                ],
                memory_settings,
                ..Settings::new()
            },
            Discard,
        );

        Links {
            rewriter: Some(rewriter),
            found,
            remaining: body,
            error: None,
        }
    }

    // Why the sequence ended early, if it did
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl Iterator for Links<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(href) = self.found.borrow_mut().pop_front() {
                return Some(href);
            }

            if self.remaining.is_empty() {
                // end() flushes anything still buffered; after that we're done
                let rewriter = self.rewriter.take()?;
                if let Err(e) = rewriter.end() {
                    self.error = Some(e.to_string());
                }
                continue;
            }

            let rewriter = self.rewriter.as_mut()?;
            let (chunk, rest) = self.remaining.split_at(self.remaining.len().min(CHUNK_SIZE));
            self.remaining = rest;

            if let Err(e) = rewriter.write(chunk) {
                self.error = Some(e.to_string());
                self.rewriter = None;
                self.remaining = &[];
            }
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why Rc<RefCell<VecDeque<String>>>?
//    - The lol_html callback needs to push links somewhere
//    - The iterator needs to pop them back out
//    - Rc lets both hold the same queue, RefCell lets both mutate it
//
// 2. Why is this iterator lazy?
//    - A page with a million links never needs a million-entry Vec
//    - The caller can stop early and we stop tokenizing too
//
// 3. What does the `?` do in `self.rewriter.take()?`
//    - In a function returning Option, `?` on None returns None right away
//    - That's how the iterator reports "no more links"
// -----------------------------------------------------------------------------
