// src/crawl/address.rs
// =============================================================================
// This module turns raw link strings into crawlable addresses.
//
// Steps for every href we find on a page:
// 1. Resolve it against the page it was found on ("/docs" -> "https://site/docs")
// 2. Normalize it (drop the "#fragment", which never changes the page)
// 3. Decide if it's crawlable (absolute, has a host, http or https)
//
// Anything that fails along the way is dropped, it's never a fatal error.
//
// Rust concepts:
// - Result<T, E>: resolve() can fail on garbage input
// - matches!: a compact way to test a value against a pattern
// =============================================================================

use url::Url;

use crate::error::CrawlError;

// Resolves a possibly-relative link against the page it was found on
//
// Examples:
//   base = "https://example.com/page/"
//   candidate = "/docs"              -> Ok("https://example.com/docs")
//   candidate = "../other"           -> Ok("https://example.com/other")
//   candidate = "https://other.com"  -> Ok("https://other.com/")
//   candidate = "http://[::1"        -> Err(MalformedAddress)
pub fn resolve(base: &Url, candidate: &str) -> Result<Url, CrawlError> {
    // join() follows the standard URL resolution rules, so absolute links
    // come back unchanged and relative ones are glued onto the base
    base.join(candidate)
        .map_err(|source| CrawlError::MalformedAddress {
            candidate: candidate.to_string(),
            source,
        })
}

// Strips the fragment so "page#intro" and "page#usage" count as one page
pub fn normalize(mut address: Url) -> Url {
    address.set_fragment(None);
    address
}

// Checks if an address is something we can fetch over the network
//
// We skip:
// - javascript: links (script-execution pseudo-scheme)
// - mailto:, tel:, data:, file: and anything else that isn't http(s)
// - http(s) URLs without a host
pub fn is_crawlable(address: &Url) -> bool {
    matches!(address.scheme(), "http" | "https") && address.host().is_some()
}

// Parses a seed from the command line
//
// Seeds have no page to be relative to, so they must already be absolute.
// Unlike links found while crawling, a bad seed is a fatal error.
pub fn parse_seed(seed: &str) -> Result<Url, CrawlError> {
    let address = Url::parse(seed).map_err(|e| CrawlError::InvalidSeed {
        seed: seed.to_string(),
        reason: e.to_string(),
    })?;

    if !is_crawlable(&address) {
        return Err(CrawlError::InvalidSeed {
            seed: seed.to_string(),
            reason: "only http and https addresses can be crawled".to_string(),
        });
    }

    Ok(normalize(address))
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why does Url::join handle absolute links too?
//    - The URL standard says resolving "https://other.com" against any base
//      just gives "https://other.com/"
//    - So one call covers relative and absolute links alike
//
// 2. Why take `mut address: Url` by value in normalize()?
//    - We own the Url, so we can change it in place and hand it back
//    - No clone needed
//
// 3. What is the difference between host() and domain()?
//    - host() is Some for domains AND IP addresses (http://127.0.0.1/)
//    - domain() is only Some for names, so we use host()
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/page/").unwrap()
    }

    #[test]
    fn test_resolve_relative_link() {
        let resolved = resolve(&base(), "/relative/path").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/relative/path");
        assert!(is_crawlable(&resolved));
    }

    #[test]
    fn test_resolve_parent_link() {
        let resolved = resolve(&base(), "../about").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/about");
    }

    #[test]
    fn test_resolve_absolute_link() {
        let resolved = resolve(&base(), "https://www.rust-lang.org").unwrap();
        assert_eq!(resolved.as_str(), "https://www.rust-lang.org/");
    }

    #[test]
    fn test_resolve_malformed_link() {
        let err = resolve(&base(), "http://[::1").unwrap_err();
        assert!(matches!(err, CrawlError::MalformedAddress { .. }));
    }

    #[test]
    fn test_absolute_address_without_base_is_crawlable() {
        let address = Url::parse("http://example.com/x").unwrap();
        assert!(is_crawlable(&address));
    }

    #[test]
    fn test_skip_javascript() {
        let address = Url::parse("javascript:alert(1)").unwrap();
        assert!(!is_crawlable(&address));

        // Resolving doesn't rescue it either
        let resolved = resolve(&base(), "javascript:void(0)").unwrap();
        assert!(!is_crawlable(&resolved));
    }

    #[test]
    fn test_skip_mailto_and_file() {
        assert!(!is_crawlable(&resolve(&base(), "mailto:test@example.com").unwrap()));
        assert!(!is_crawlable(&Url::parse("file:///etc/passwd").unwrap()));
    }

    #[test]
    fn test_normalize_drops_fragment() {
        let a = normalize(resolve(&base(), "/docs#intro").unwrap());
        let b = normalize(resolve(&base(), "/docs#usage").unwrap());
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "https://example.com/docs");
    }

    #[test]
    fn test_parse_seed() {
        let seed = parse_seed("http://example.com/#top").unwrap();
        assert_eq!(seed.as_str(), "http://example.com/");

        assert!(matches!(
            parse_seed("/relative"),
            Err(CrawlError::InvalidSeed { .. })
        ));
        assert!(matches!(
            parse_seed("ftp://example.com/file"),
            Err(CrawlError::InvalidSeed { .. })
        ));
    }
}
