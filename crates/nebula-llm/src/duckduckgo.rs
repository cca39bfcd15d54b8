//! DuckDuckGo live search — HTML scraping, no API key required
//!
//! Posts to the HTML endpoint (GET with non-ASCII queries tends to trigger
//! a CAPTCHA) and parses results with regexes.

use crate::capability::{Recency, SearchCapability};
use crate::error::{Error, Result};
use regex::Regex;
use reqwest::Client;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, warn};

/// Maximum number of search results to return
const MAX_RESULTS: usize = 5;

/// HTTP timeout for the search request
const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

/// User-Agent header to avoid bot blocking
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// Title:   <a class="result__a" href="...">TITLE</a>
// Snippet: <a class="result__snippet">SNIPPET</a>
static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a[^>]+class="result__a"[^>]+href="([^"]*)"[^>]*>(.*?)</a>"#)
        .expect("title regex is a compile-time constant")
});
static SNIPPET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a[^>]+class="result__snippet"[^>]*>(.*?)</a>"#)
        .expect("snippet regex is a compile-time constant")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag regex is a compile-time constant"));

/// A single search result entry
#[derive(Debug, Clone)]
struct SearchResult {
    title: String,
    url: String,
    snippet: String,
}

/// DuckDuckGo HTML-based search capability
pub struct DuckDuckGoSearch {
    client: Client,
}

impl DuckDuckGoSearch {
    /// Create a new search client
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self { client })
    }

    async fn fetch(&self, query: &str, recency: Option<Recency>) -> Result<Vec<SearchResult>> {
        // `df` maps to DuckDuckGo's date filter: d / w / m
        let df = recency.map(|r| match r {
            Recency::Day => "d",
            Recency::Week => "w",
            Recency::Month => "m",
        });

        let mut form: Vec<(&str, &str)> = vec![("q", query)];
        if let Some(df) = df {
            form.push(("df", df));
        }

        debug!(query = %query, "Fetching DuckDuckGo search results");

        let response = self
            .client
            .post("https://html.duckduckgo.com/html/")
            .header("Referer", "https://html.duckduckgo.com/")
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::Network(format!("search request failed: {}", e)))?;

        let html = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if html.contains("anomaly-modal") {
            warn!("DuckDuckGo returned CAPTCHA page — bot detection triggered");
            return Err(Error::Network(
                "DuckDuckGo CAPTCHA triggered; search temporarily blocked".to_string(),
            ));
        }

        Ok(parse_search_results(&html, MAX_RESULTS))
    }
}

#[async_trait::async_trait]
impl SearchCapability for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str, recency: Option<Recency>) -> Result<String> {
        let results = self.fetch(query, recency).await?;
        if results.is_empty() {
            return Ok(format!("No results found for '{}'.", query));
        }

        let formatted: Vec<String> = results
            .iter()
            .map(|r| format!("{}\n{}\n{}", r.title, r.url, r.snippet))
            .collect();
        Ok(formatted.join("\n\n"))
    }
}

/// Parse search results from DuckDuckGo HTML
fn parse_search_results(html: &str, max_results: usize) -> Vec<SearchResult> {
    let titles: Vec<(String, String)> = TITLE_RE
        .captures_iter(html)
        .map(|cap| {
            let raw_url = cap.get(1).map_or("", |m| m.as_str());
            let url = extract_real_url(raw_url);
            let title = strip_html_tags(cap.get(2).map_or("", |m| m.as_str()));
            (url, title)
        })
        .collect();

    let snippets: Vec<String> = SNIPPET_RE
        .captures_iter(html)
        .map(|cap| strip_html_tags(cap.get(1).map_or("", |m| m.as_str())))
        .collect();

    titles
        .into_iter()
        .enumerate()
        .take(max_results)
        .map(|(i, (url, title))| SearchResult {
            title,
            url,
            snippet: snippets.get(i).cloned().unwrap_or_default(),
        })
        .filter(|r| !r.url.is_empty() && !r.title.is_empty())
        .collect()
}

/// DuckDuckGo wraps URLs in a redirect: `//duckduckgo.com/l/?uddg=REAL_URL&...`.
/// Extract the actual destination URL.
fn extract_real_url(raw: &str) -> String {
    if let Some(pos) = raw.find("uddg=") {
        let rest = &raw[pos + 5..];
        let end = rest.find('&').unwrap_or(rest.len());
        urlencoding::decode(&rest[..end])
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| rest[..end].to_string())
    } else {
        raw.to_string()
    }
}

/// Remove HTML tags and decode common HTML entities
fn strip_html_tags(s: &str) -> String {
    let stripped = TAG_RE.replace_all(s, "");
    stripped
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <div class="result results_links">
          <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&rut=abc">Rust Programming <b>Language</b></a>
          <a class="result__snippet">A language empowering everyone to build &amp; ship software.</a>
        </div>
        <div class="result results_links">
          <a rel="nofollow" class="result__a" href="https://doc.rust-lang.org/book/">The Rust Book</a>
          <a class="result__snippet">Learn Rust step by step.</a>
        </div>
    "#;

    #[test]
    fn test_parse_search_results() {
        let results = parse_search_results(SAMPLE_HTML, 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://www.rust-lang.org/");
        assert_eq!(results[0].title, "Rust Programming Language");
        assert!(results[0].snippet.contains("build & ship"));
        assert_eq!(results[1].url, "https://doc.rust-lang.org/book/");
    }

    #[test]
    fn test_parse_respects_max_results() {
        let results = parse_search_results(SAMPLE_HTML, 1);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_extract_real_url() {
        let raw = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpath&rut=xyz";
        assert_eq!(extract_real_url(raw), "https://example.com/path");
        assert_eq!(extract_real_url("https://direct.example.com"), "https://direct.example.com");
    }

    #[test]
    fn test_extract_real_url_multibyte_after_percent() {
        // Scraped HTML can contain a bare `%` followed by multibyte text.
        let decoded = extract_real_url("//duckduckgo.com/l/?uddg=%aérest&rut=x");
        assert_eq!(decoded, "%aérest");
    }

    #[test]
    fn test_extract_real_url_invalid_escape_left_as_is() {
        assert_eq!(extract_real_url("//duckduckgo.com/l/?uddg=%zzfoo&rut=x"), "%zzfoo");
    }

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(strip_html_tags("<b>bold</b> &amp; plain"), "bold & plain");
    }
}
