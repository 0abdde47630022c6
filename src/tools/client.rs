use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a tool call produced no usable result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolFailureKind {
    /// Timeout, connection failure or non-success status from the tool server
    Network,
    /// The tool server answered, but the body could not be understood
    Protocol,
}

impl fmt::Display for ToolFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolFailureKind::Network => f.write_str("network"),
            ToolFailureKind::Protocol => f.write_str("protocol"),
        }
    }
}

/// Typed failure of a single tool call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} failure: {message}")]
pub struct ToolFailure {
    pub kind: ToolFailureKind,
    pub message: String,
}

impl ToolFailure {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ToolFailureKind::Network,
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self {
            kind: ToolFailureKind::Protocol,
            message: message.into(),
        }
    }
}

pub type ToolResult<T> = std::result::Result<T, ToolFailure>;

/// One search candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

/// Ordered candidates for a query, best first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub url: String,
    pub content_text: String,
    pub fetched_at: DateTime<Utc>,
}

/// Summary of what a page says about the query. Empty when the extractor
/// found nothing relevant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractResult {
    pub summary: String,
}

impl ExtractResult {
    pub fn is_empty(&self) -> bool {
        self.summary.trim().is_empty()
    }
}

/// Contract of the tool boundary.
///
/// Implementations must be callable concurrently. They never retry: a
/// failure is reported once and the caller decides what to do with it.
#[async_trait]
pub trait ToolClient: Send + Sync {
    /// Run a web search for `query`.
    async fn search(&self, query: &str) -> ToolResult<SearchResult>;

    /// Fetch the visible text of `url`.
    async fn scrape(&self, url: &str) -> ToolResult<ScrapeResult>;

    /// Summarize `text` (scraped from `source_url`) with respect to `context`.
    async fn extract(&self, text: &str, context: &str, source_url: &str)
        -> ToolResult<ExtractResult>;

    /// Liveness probe of the tool server.
    async fn health(&self) -> ToolResult<()>;
}
