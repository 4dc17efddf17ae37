// src/error.rs
// =============================================================================
// Error types for the crawler.
//
// Every variant except InvalidSeed is recovered locally by the stage that
// produced it: the link or address is dropped, the failure is logged, and the
// rest of the crawl carries on. InvalidSeed is the only fatal one; it stops
// the program before any crawling starts.
//
// Rust concepts:
// - thiserror: derive macro that writes the Display and Error impls for us
// - #[source]: keeps the underlying error around for `{:#}` style chains
// =============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    /// A link string did not parse as a URL (even relative to its page)
    #[error("malformed address '{candidate}': {source}")]
    MalformedAddress {
        candidate: String,
        #[source]
        source: url::ParseError,
    },

    /// Network error, timeout, bad status, or a body we won't read
    #[error("fetch failed for {address}: {reason}")]
    FetchFailed { address: String, reason: String },

    /// The HTML tokenizer gave up part way through a page
    #[error("markup parse error in {address}: {reason}")]
    MarkupParseError { address: String, reason: String },

    /// A seed given on the command line is unusable
    #[error("invalid seed '{seed}': {reason}")]
    InvalidSeed { seed: String, reason: String },
}

impl CrawlError {
    // Shorthand used by the fetcher, which builds this variant a lot
    pub fn fetch_failed(address: impl ToString, reason: impl ToString) -> Self {
        CrawlError::FetchFailed {
            address: address.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failed_message() {
        let err = CrawlError::fetch_failed("http://example.com/", "HTTP 404");
        assert_eq!(
            err.to_string(),
            "fetch failed for http://example.com/: HTTP 404"
        );
    }

    #[test]
    fn test_malformed_address_keeps_source() {
        let source = url::Url::parse("http://[::1").unwrap_err();
        let err = CrawlError::MalformedAddress {
            candidate: "http://[::1".to_string(),
            source,
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("malformed address 'http://[::1'"));
    }
}
