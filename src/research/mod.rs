//! Research Task Orchestration
//!
//! This module is the orchestration core: it accepts investigation requests,
//! runs each one in the background against the tool boundary, and serves
//! consistent progress snapshots to pollers.
//!
//! # Architecture
//!
//! - [`store::TaskStore`] - Registry of task status records; per-task
//!   serialized writes, lock-free snapshot reads
//! - [`accumulator::FindingAccumulator`] - Findings keyed by source link,
//!   last write wins
//! - [`agent::ResearchAgent`] - The per-task state machine
//!   (planning, searching, scraping, extracting, finalizing)
//! - [`dispatcher::TaskDispatcher`] - Admission, background scheduling,
//!   polling and cancellation
//!
//! # Usage
//!
//! ```ignore
//! use sentinel::research::{TaskDispatcher, TaskStore};
//!
//! let store = Arc::new(TaskStore::new());
//! let dispatcher = TaskDispatcher::new(store, tools, 4);
//!
//! let task_id = dispatcher.submit(InvestigationRequest::cve("CVE-2023-0001"))?;
//! loop {
//!     let status = dispatcher.poll(task_id)?;
//!     if status.is_terminal() {
//!         break;
//!     }
//!     tokio::time::sleep(Duration::from_secs(1)).await;
//! }
//! ```
//!
//! # Failure Handling
//!
//! A failed search, scrape or extract call is written to the progress log
//! and the step is skipped. The task only ends in `error` when every search
//! query failed, or when the agent itself dies.

/// Findings accumulation.
pub mod accumulator;
/// The research state machine.
pub mod agent;
/// Admission and scheduling.
pub mod dispatcher;
/// Task status registry.
pub mod store;

pub use accumulator::FindingAccumulator;
pub use agent::{Phase, PlannedQuery, ResearchAgent, plan_queries};
pub use dispatcher::TaskDispatcher;
pub use store::TaskStore;
