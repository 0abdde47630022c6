//! Mock implementations for testing.
//!
//! [`StubToolClient`] answers search, scrape and extract calls from
//! fixtures configured per query or per URL, so the research agent can be
//! exercised without a tool server.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sentinel::tools::{
    ExtractResult, ScrapeResult, SearchHit, SearchResult, ToolClient, ToolFailure, ToolResult,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Scripted tool client.
///
/// - Searches for unknown queries return no candidates, or the default hits
///   when [`StubToolClient::with_default_search`] was used.
/// - Scrapes of unknown URLs fail with a network failure.
/// - Extracts for unknown URLs return an empty summary.
///
/// # Examples
///
/// ```ignore
/// let tools = StubToolClient::new()
///     .with_search("CVE-2023-0001", &["https://nvd.example/CVE-2023-0001"])
///     .with_page("https://nvd.example/CVE-2023-0001", "page text")
///     .with_summary("https://nvd.example/CVE-2023-0001", "Remote code execution in X");
/// ```
#[derive(Clone, Default)]
pub struct StubToolClient {
    searches: HashMap<String, ToolResult<SearchResult>>,
    default_search: Option<ToolResult<SearchResult>>,
    scrapes: HashMap<String, ToolResult<ScrapeResult>>,
    extracts: HashMap<String, ToolResult<ExtractResult>>,
    healthy: bool,
    health_delay: Duration,
    delay: Duration,
    calls: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

fn hits(urls: &[&str]) -> SearchResult {
    SearchResult {
        results: urls
            .iter()
            .map(|url| SearchHit {
                title: format!("Result for {}", url),
                url: url.to_string(),
                snippet: String::new(),
            })
            .collect(),
    }
}

impl StubToolClient {
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    pub fn with_search(mut self, query: &str, urls: &[&str]) -> Self {
        self.searches.insert(query.to_string(), Ok(hits(urls)));
        self
    }

    pub fn failing_search(mut self, query: &str) -> Self {
        self.searches.insert(
            query.to_string(),
            Err(ToolFailure::network("search backend unreachable")),
        );
        self
    }

    pub fn with_default_search(mut self, urls: &[&str]) -> Self {
        self.default_search = Some(Ok(hits(urls)));
        self
    }

    pub fn failing_every_search(mut self) -> Self {
        self.default_search = Some(Err(ToolFailure::network("search backend unreachable")));
        self
    }

    pub fn with_page(mut self, url: &str, text: &str) -> Self {
        self.scrapes.insert(
            url.to_string(),
            Ok(ScrapeResult {
                url: url.to_string(),
                content_text: text.to_string(),
                fetched_at: Utc::now(),
            }),
        );
        self
    }

    pub fn failing_scrape(mut self, url: &str) -> Self {
        self.scrapes.insert(
            url.to_string(),
            Err(ToolFailure::network("tool server returned 502 Bad Gateway")),
        );
        self
    }

    pub fn with_summary(mut self, url: &str, summary: &str) -> Self {
        self.extracts.insert(
            url.to_string(),
            Ok(ExtractResult {
                summary: summary.to_string(),
            }),
        );
        self
    }

    pub fn failing_extract(mut self, url: &str) -> Self {
        self.extracts.insert(
            url.to_string(),
            Err(ToolFailure::protocol("unparseable tool response")),
        );
        self
    }

    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Sleep this long before answering a health probe.
    pub fn with_health_delay(mut self, delay: Duration) -> Self {
        self.health_delay = delay;
        self
    }

    /// Sleep this long inside every tool call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Every call made so far, as `"<tool> <argument>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Highest number of tool calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, call: String) {
        self.calls.lock().push(call);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ToolClient for StubToolClient {
    async fn search(&self, query: &str) -> ToolResult<SearchResult> {
        self.enter(format!("search {}", query)).await;
        let result = self
            .searches
            .get(query)
            .or(self.default_search.as_ref())
            .cloned()
            .unwrap_or_else(|| Ok(SearchResult::default()));
        self.leave();
        result
    }

    async fn scrape(&self, url: &str) -> ToolResult<ScrapeResult> {
        self.enter(format!("scrape {}", url)).await;
        let result = self
            .scrapes
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(ToolFailure::network(format!("no page for {}", url))));
        self.leave();
        result
    }

    async fn extract(&self, _text: &str, context: &str, source_url: &str) -> ToolResult<ExtractResult> {
        self.enter(format!("extract {} [{}]", source_url, context)).await;
        let result = self
            .extracts
            .get(source_url)
            .cloned()
            .unwrap_or_else(|| Ok(ExtractResult::default()));
        self.leave();
        result
    }

    async fn health(&self) -> ToolResult<()> {
        if !self.health_delay.is_zero() {
            tokio::time::sleep(self.health_delay).await;
        }
        if self.healthy {
            Ok(())
        } else {
            Err(ToolFailure::network("connection refused"))
        }
    }
}
