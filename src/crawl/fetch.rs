// src/crawl/fetch.rs
// =============================================================================
// This module downloads pages.
//
// Key functionality:
// - The Fetch trait: "given an address, give me the page bytes as a stream"
// - HttpFetcher: the real implementation, built on reqwest
// - read_body(): drains a stream into memory with a size cap
//
// Why a trait?
// - The crawl pipeline only needs *something* that can fetch
// - Production uses HttpFetcher; the pipeline tests plug in an in-memory site
//
// Every failure here becomes CrawlError::FetchFailed. The pipeline logs it
// and drops the address: no retries.
//
// Rust concepts:
// - async-trait: async methods on a trait we can put behind Arc<dyn Fetch>
// - Streams: like iterators, but each item may take a while to arrive
// =============================================================================

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use reqwest::{header::CONTENT_TYPE, Client};
use url::Url;

use super::config::CrawlConfig;
use crate::error::CrawlError;

// Pages bigger than this are abandoned (same cap as most crawlers use)
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

const USER_AGENT: &str = concat!("link-census/", env!("CARGO_PKG_VERSION"));

// The body of a page, arriving chunk by chunk.
// Dropping it closes the underlying connection.
pub type ByteStream = BoxStream<'static, Result<Bytes, CrawlError>>;

#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, address: &Url) -> Result<ByteStream, CrawlError>;
}

// Fetches pages over HTTP(S)
//
// One client is shared by every worker, so connections to the same host
// are pooled and reused.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, address: &Url) -> Result<ByteStream, CrawlError> {
        let response = self
            .client
            .get(address.clone())
            .send()
            .await
            .map_err(|e| CrawlError::fetch_failed(address, describe_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::fetch_failed(
                address,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        // No content-type header at all is fine, we'll just try to parse it
        if let Some(content_type) = response.headers().get(CONTENT_TYPE) {
            let content_type = content_type.to_str().unwrap_or("");
            if !is_html(content_type) {
                return Err(CrawlError::fetch_failed(
                    address,
                    format!("not an HTML page ({})", content_type),
                ));
            }
        }

        if let Some(length) = response.content_length() {
            if length > MAX_BODY_BYTES as u64 {
                return Err(CrawlError::fetch_failed(
                    address,
                    format!("response too large: {} bytes", length),
                ));
            }
        }

        let source = address.to_string();
        let stream = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| CrawlError::fetch_failed(&source, describe_error(&e))));

        Ok(stream.boxed())
    }
}

// Reads a whole body into memory, giving up past MAX_BODY_BYTES
//
// The stream is consumed here, so it's closed on every way out of this
// function: finished, failed mid-way, or too large.
pub async fn read_body(address: &Url, mut stream: ByteStream) -> Result<Vec<u8>, CrawlError> {
    let mut body = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if body.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(CrawlError::fetch_failed(
                address,
                format!("response larger than {} bytes", MAX_BODY_BYTES),
            ));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

// Turns a reqwest error into a short, readable reason
fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_redirect() {
        "too many redirects".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&CrawlConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_html_page() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(r#"<a href="/a">a</a>"#)
            .create_async()
            .await;

        let address = Url::parse(&format!("{}/", server.url())).unwrap();
        let stream = fetcher().fetch(&address).await.unwrap();
        let body = read_body(&address, stream).await.unwrap();

        assert_eq!(body, br#"<a href="/a">a</a>"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_not_found_is_fetch_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let address = Url::parse(&format!("{}/missing", server.url())).unwrap();
        match fetcher().fetch(&address).await {
            Err(CrawlError::FetchFailed { reason, .. }) => assert_eq!(reason, "HTTP 404"),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("404 should not produce a body"),
        }
    }

    #[tokio::test]
    async fn test_non_html_is_fetch_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/logo.png")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body([0x89, b'P', b'N', b'G'])
            .create_async()
            .await;

        let address = Url::parse(&format!("{}/logo.png", server.url())).unwrap();
        let result = fetcher().fetch(&address).await;
        assert!(matches!(result, Err(CrawlError::FetchFailed { .. })));
    }

    #[tokio::test]
    async fn test_connection_refused_is_fetch_failure() {
        // Nothing listens on port 1
        let address = Url::parse("http://127.0.0.1:1/").unwrap();
        let result = fetcher().fetch(&address).await;
        assert!(matches!(result, Err(CrawlError::FetchFailed { .. })));
    }

    #[tokio::test]
    async fn test_read_body_stops_on_stream_error() {
        let address = Url::parse("http://example.com/").unwrap();
        let chunks: Vec<Result<Bytes, CrawlError>> = vec![
            Ok(Bytes::from_static(b"<a href")),
            Err(CrawlError::fetch_failed(&address, "connection reset")),
        ];
        let result = read_body(&address, futures::stream::iter(chunks).boxed()).await;
        assert!(matches!(result, Err(CrawlError::FetchFailed { .. })));
    }

    #[test]
    fn test_is_html() {
        assert!(is_html("text/html"));
        assert!(is_html("Text/HTML; charset=UTF-8"));
        assert!(is_html("application/xhtml+xml"));
        assert!(!is_html("application/json"));
        assert!(!is_html(""));
    }
}
