//! # Sentinel - OSINT Research Task Server
//!
//! Sentinel runs a single autonomous research agent per submitted
//! investigation. The agent drives three external tools (search, scrape and
//! extract) through a fixed tool boundary, accumulates findings with their
//! provenance, and exposes incremental progress to polling clients.
//!
//! ## Overview
//!
//! Sentinel can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `sentinel-server` binary
//! 2. **As a library** - Embed the orchestration core with your own
//!    [`ToolClient`](tools::ToolClient)
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use sentinel::research::{TaskDispatcher, TaskStore};
//! use sentinel::tools::HttpToolClient;
//! use sentinel::types::InvestigationRequest;
//! use std::sync::Arc;
//!
//! let tools = Arc::new(HttpToolClient::new(&config.tools)?);
//! let dispatcher = TaskDispatcher::new(Arc::new(TaskStore::new()), tools, 4);
//!
//! let task_id = dispatcher.submit(InvestigationRequest::cve("CVE-2023-0001"))?;
//! let status = dispatcher.poll(task_id)?;
//! println!("{} ({} log entries)", status.state, status.progress_log.len());
//! ```
//!
//! ## Modules
//!
//! - [`research`] - Task store, finding accumulator, research agent, dispatcher
//! - [`tools`] - Tool boundary contract and HTTP client
//! - [`api`] - REST handlers and routes
//! - [`cli`] - Command-line parsing and output
//! - [`types`] - Requests, task status, errors
//! - [`utils`] - TOML configuration

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// Research task orchestration.
pub mod research;
/// The search/scrape/extract tool boundary.
pub mod tools;
/// Core types (requests, task status, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use api::routes::build_app;
pub use research::{FindingAccumulator, ResearchAgent, TaskDispatcher, TaskStore};
pub use tools::{HttpToolClient, ToolClient, ToolFailure};
pub use types::{AppError, InvestigationRequest, Result, TaskId, TaskState, TaskStatus};
pub use utils::toml_config::{SentinelConfig, SentinelConfigManager};

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Live TOML configuration, reloaded when the file changes
    pub config_manager: Arc<SentinelConfigManager>,
    /// Admission, scheduling and polling of research tasks
    pub dispatcher: TaskDispatcher,
    /// Tool boundary, shared with the dispatcher's agent
    pub tools: Arc<dyn ToolClient>,
}

impl AppState {
    /// Wire a fresh task store and the dispatcher around `tools`. The
    /// dispatcher and the health handler read the live configuration.
    pub fn new(config_manager: Arc<SentinelConfigManager>, tools: Arc<dyn ToolClient>) -> Self {
        let dispatcher = TaskDispatcher::with_config(
            Arc::new(TaskStore::new()),
            Arc::clone(&tools),
            Arc::clone(&config_manager),
        );

        Self {
            config_manager,
            dispatcher,
            tools,
        }
    }
}
