//! Tool Boundary
//!
//! All external data reaches the orchestration core through three tools
//! exposed by a tool server: `search`, `scrape` and `extract`. The set is
//! fixed; there is no discovery.
//!
//! # Module Structure
//!
//! - [`client`](crate::tools::client) - The [`ToolClient`] contract, result
//!   types and [`ToolFailure`]
//! - [`http`](crate::tools::http) - [`HttpToolClient`], the JSON-over-HTTP
//!   binding used by the server binary
//!
//! # Failure Model
//!
//! Every call is bounded by a timeout. Timeouts, transport errors and
//! non-success statuses surface as [`ToolFailureKind::Network`]; bodies that
//! cannot be decoded surface as [`ToolFailureKind::Protocol`]. Clients do not
//! retry.
//!
//! ```ignore
//! let tools = HttpToolClient::new(&config.tools)?;
//! tools.health().await?;
//! let hits = tools.search("CVE-2023-0001").await?;
//! ```

/// Tool contract and result types.
pub mod client;
/// HTTP tool client.
pub mod http;

pub use client::{
    ExtractResult, ScrapeResult, SearchHit, SearchResult, ToolClient, ToolFailure,
    ToolFailureKind, ToolResult,
};
pub use http::HttpToolClient;
