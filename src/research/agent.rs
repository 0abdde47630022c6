//! Research Agent
//!
//! Drives one investigation through an explicit state machine:
//!
//! ```text
//! Planning -> Searching -> Scraping -> Extracting -> Finalizing -> Done
//!                 |
//!                 +-- every query failed --------------> Finalizing (error)
//! ```
//!
//! Within Searching, Scraping and Extracting the independent tool calls run
//! concurrently, at most `max_concurrency` at a time. A failed tool call is
//! logged and skipped. Only a total search failure is fatal to the task.
//!
//! The agent holds no task state of its own: every observable effect goes
//! through the [`TaskStore`].

use crate::research::accumulator::FindingAccumulator;
use crate::research::store::TaskStore;
use crate::tools::{ScrapeResult, ToolClient};
use crate::types::{Finding, InvestigationRequest, RequestField, TaskId, TaskState};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// States of a single agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Planning,
    Searching,
    Scraping,
    Extracting,
    Finalizing,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Planning => "planning",
            Phase::Searching => "searching",
            Phase::Scraping => "scraping",
            Phase::Extracting => "extracting",
            Phase::Finalizing => "finalizing",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// A search query derived from one request field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedQuery {
    pub field: RequestField,
    pub text: String,
}

/// Build one query per non-empty request field.
pub fn plan_queries(request: &InvestigationRequest) -> Vec<PlannedQuery> {
    request
        .present_fields()
        .into_iter()
        .map(|(field, value)| {
            let text = match field {
                RequestField::Phone => format!("phone:{}", value),
                RequestField::Id => format!("id:{}", value),
                RequestField::Cve if value.to_ascii_uppercase().starts_with("CVE-") => {
                    value.to_string()
                }
                RequestField::Cve => format!("CVE:{}", value),
                RequestField::Keyword => value.to_string(),
            };
            PlannedQuery { field, text }
        })
        .collect()
}

/// A distinct link to visit, with the query that surfaced it first.
#[derive(Debug, Clone)]
struct Candidate {
    url: String,
    title: String,
    query: String,
}

struct ScrapedPage {
    candidate: Candidate,
    page: ScrapeResult,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Completed,
    Fatal(String),
    /// The task was made terminal by someone else (cancellation)
    Interrupted,
}

/// The single autonomous research agent.
pub struct ResearchAgent {
    tools: Arc<dyn ToolClient>,
    store: Arc<TaskStore>,
    findings: FindingAccumulator,
    max_concurrency: usize,
}

impl ResearchAgent {
    pub fn new(tools: Arc<dyn ToolClient>, store: Arc<TaskStore>, max_concurrency: usize) -> Self {
        Self {
            findings: FindingAccumulator::new(Arc::clone(&store)),
            tools,
            store,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Run `request` for `task_id` until the task is terminal.
    pub async fn run(&self, task_id: TaskId, request: InvestigationRequest) {
        if !self.store.contains(task_id) {
            warn!(task_id = %task_id, "Agent started for unknown task");
            return;
        }

        info!(task_id = %task_id, "Research task started");
        self.log(task_id, "Task started.");
        let _ = self.store.transition(task_id, TaskState::Running);

        let mut phase = Phase::Planning;
        let outcome = self.drive(task_id, &request, &mut phase).await;
        self.finalize(task_id, outcome, &mut phase);
    }

    async fn drive(
        &self,
        task_id: TaskId,
        request: &InvestigationRequest,
        phase: &mut Phase,
    ) -> Outcome {
        self.log(task_id, "Planning: preparing queries from input fields.");

        let queries = plan_queries(request);
        if queries.is_empty() {
            return Outcome::Fatal("request has no non-empty fields".to_string());
        }
        for query in &queries {
            self.log(task_id, format!("Query [{}]: {:?}", query.field, query.text));
        }

        self.advance(task_id, phase, Phase::Searching, format!(
            "issuing {} search quer{}",
            queries.len(),
            if queries.len() == 1 { "y" } else { "ies" }
        ));
        let candidates = match self.search_all(task_id, &queries).await {
            Ok(candidates) => candidates,
            Err(outcome) => return outcome,
        };

        self.advance(task_id, phase, Phase::Scraping, format!(
            "{} distinct candidate link(s)",
            candidates.len()
        ));
        let pages = self.scrape_all(task_id, candidates).await;
        if self.interrupted(task_id) {
            return Outcome::Interrupted;
        }

        self.advance(task_id, phase, Phase::Extracting, format!(
            "{} page(s) scraped successfully",
            pages.len()
        ));
        self.extract_all(task_id, pages).await;
        if self.interrupted(task_id) {
            return Outcome::Interrupted;
        }

        Outcome::Completed
    }

    /// Searching: one concurrent search per query, candidates de-duplicated
    /// across queries in query order.
    async fn search_all(
        &self,
        task_id: TaskId,
        queries: &[PlannedQuery],
    ) -> Result<Vec<Candidate>, Outcome> {
        let results: Vec<Option<Vec<Candidate>>> = stream::iter(0..queries.len())
            .map(|idx| {
                let query = &queries[idx];
                async move {
                if self.interrupted(task_id) {
                    return None;
                }
                match self.tools.search(&query.text).await {
                    Ok(result) => {
                        self.log(task_id, format!(
                            "Search {:?} returned {} candidate result(s).",
                            query.text,
                            result.results.len()
                        ));
                        Some(
                            result
                                .results
                                .into_iter()
                                .filter(|hit| !hit.url.trim().is_empty())
                                .map(|hit| Candidate {
                                    url: hit.url.trim().to_string(),
                                    title: hit.title,
                                    query: query.text.clone(),
                                })
                                .collect(),
                        )
                    }
                    Err(failure) => {
                        warn!(task_id = %task_id, query = %query.text, error = %failure, "Search failed");
                        self.log(task_id, format!("Search {:?} failed: {}", query.text, failure));
                        None
                    }
                }
            }})
            .buffered(self.max_concurrency)
            .collect()
            .await;

        if self.interrupted(task_id) {
            return Err(Outcome::Interrupted);
        }

        if results.iter().all(Option::is_none) {
            return Err(Outcome::Fatal(format!(
                "all {} search quer{} failed",
                queries.len(),
                if queries.len() == 1 { "y" } else { "ies" }
            )));
        }

        let mut seen = HashSet::new();
        Ok(results
            .into_iter()
            .flatten()
            .flatten()
            .filter(|candidate| seen.insert(candidate.url.clone()))
            .collect())
    }

    /// Scraping: failures are logged and the candidate is dropped.
    async fn scrape_all(&self, task_id: TaskId, candidates: Vec<Candidate>) -> Vec<ScrapedPage> {
        let total = candidates.len();
        let pages: Vec<Option<ScrapedPage>> = stream::iter(candidates.into_iter().enumerate())
            .map(|(idx, candidate)| async move {
                if self.interrupted(task_id) {
                    return None;
                }
                match self.tools.scrape(&candidate.url).await {
                    Ok(page) => {
                        debug!(task_id = %task_id, url = %candidate.url, chars = page.content_text.len(), "Scraped page");
                        self.log(task_id, format!(
                            "[{}/{}] Scraped {} ({}, {} chars).",
                            idx + 1,
                            total,
                            candidate.url,
                            display_title(&candidate.title),
                            page.content_text.chars().count()
                        ));
                        Some(ScrapedPage { candidate, page })
                    }
                    Err(failure) => {
                        warn!(task_id = %task_id, url = %candidate.url, error = %failure, "Scrape failed");
                        self.log(task_id, format!(
                            "[{}/{}] Scrape of {} failed: {}",
                            idx + 1,
                            total,
                            candidate.url,
                            failure
                        ));
                        None
                    }
                }
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        pages.into_iter().flatten().collect()
    }

    /// Extracting: every non-empty summary becomes a finding for its link.
    async fn extract_all(&self, task_id: TaskId, pages: Vec<ScrapedPage>) {
        let total = pages.len();
        stream::iter(pages.into_iter().enumerate())
            .for_each_concurrent(self.max_concurrency, |(idx, scraped)| async move {
                if self.interrupted(task_id) {
                    return;
                }
                let url = &scraped.candidate.url;
                let extracted = self
                    .tools
                    .extract(&scraped.page.content_text, &scraped.candidate.query, url)
                    .await;

                match extracted {
                    Ok(result) if result.is_empty() => {
                        self.log(task_id, format!(
                            "[{}/{}] No relevant information found on {}.",
                            idx + 1,
                            total,
                            url
                        ));
                    }
                    Ok(result) => {
                        let finding = Finding::from_link(url, result.summary.trim(), Utc::now());
                        self.log(task_id, format!(
                            "[{}/{}] Extracted finding from {}.",
                            idx + 1,
                            total,
                            finding.website_name
                        ));
                        if let Err(e) = self.findings.add(task_id, finding) {
                            warn!(task_id = %task_id, error = %e, "Failed to record finding");
                        }
                    }
                    Err(failure) => {
                        warn!(task_id = %task_id, url = %url, error = %failure, "Extract failed");
                        self.log(task_id, format!(
                            "[{}/{}] Extract for {} failed: {}",
                            idx + 1,
                            total,
                            url,
                            failure
                        ));
                    }
                }
            })
            .await;
    }

    fn finalize(&self, task_id: TaskId, outcome: Outcome, phase: &mut Phase) {
        if outcome == Outcome::Interrupted {
            info!(task_id = %task_id, "Research task stopped at a tool-call boundary");
            return;
        }

        let count = self
            .findings
            .snapshot(task_id)
            .map(|findings| findings.len())
            .unwrap_or(0);
        self.advance(task_id, phase, Phase::Finalizing, format!(
            "{} unique finding(s) collected",
            count
        ));

        match outcome {
            Outcome::Completed => {
                self.advance(task_id, phase, Phase::Done, "task completed".to_string());
                let _ = self.store.transition(task_id, TaskState::Completed);
                info!(task_id = %task_id, findings = count, "Research task completed");
            }
            Outcome::Fatal(detail) => {
                self.advance(task_id, phase, Phase::Done, format!("task failed: {}", detail));
                let _ = self.store.set_error(task_id, detail.clone());
                warn!(task_id = %task_id, error = %detail, "Research task failed");
            }
            Outcome::Interrupted => {}
        }
    }

    fn advance(&self, task_id: TaskId, phase: &mut Phase, next: Phase, detail: String) {
        debug!(task_id = %task_id, from = %phase, to = %next, "Phase transition");
        self.log(task_id, format!("{} -> {}: {}.", phase, next, detail));
        *phase = next;
    }

    fn log(&self, task_id: TaskId, message: impl Into<String>) {
        if let Err(e) = self.store.append_log(task_id, message) {
            warn!(task_id = %task_id, error = %e, "Failed to append progress entry");
        }
    }

    /// Whether the task was made terminal outside this run.
    fn interrupted(&self, task_id: TaskId) -> bool {
        self.store.is_terminal(task_id).unwrap_or(true)
    }
}

fn display_title(title: &str) -> &str {
    let title = title.trim();
    if title.is_empty() {
        "untitled"
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ExtractResult, SearchHit, SearchResult, ToolFailure, ToolResult};
    use async_trait::async_trait;
    use rstest::rstest;

    /// Every search returns the same hits; scrape/extract succeed unless the
    /// URL contains "bad".
    struct FixedTools {
        hits: Vec<&'static str>,
        fail_search: bool,
    }

    #[async_trait]
    impl ToolClient for FixedTools {
        async fn search(&self, _query: &str) -> ToolResult<SearchResult> {
            if self.fail_search {
                return Err(ToolFailure::network("connection refused"));
            }
            Ok(SearchResult {
                results: self
                    .hits
                    .iter()
                    .map(|url| SearchHit {
                        title: "hit".into(),
                        url: url.to_string(),
                        snippet: String::new(),
                    })
                    .collect(),
            })
        }

        async fn scrape(&self, url: &str) -> ToolResult<ScrapeResult> {
            if url.contains("bad") {
                return Err(ToolFailure::network("HTTP 502"));
            }
            Ok(ScrapeResult {
                url: url.to_string(),
                content_text: format!("text of {}", url),
                fetched_at: Utc::now(),
            })
        }

        async fn extract(&self, _text: &str, context: &str, url: &str) -> ToolResult<ExtractResult> {
            Ok(ExtractResult {
                summary: format!("{} mentioned on {}", context, url),
            })
        }

        async fn health(&self) -> ToolResult<()> {
            Ok(())
        }
    }

    #[rstest]
    #[case(InvestigationRequest { phone_number: Some("+1 555".into()), ..Default::default() }, "phone:+1 555")]
    #[case(InvestigationRequest { identifier: Some("A123".into()), ..Default::default() }, "id:A123")]
    #[case(InvestigationRequest::cve("CVE-2023-0001"), "CVE-2023-0001")]
    #[case(InvestigationRequest::cve("2023-0001"), "CVE:2023-0001")]
    #[case(InvestigationRequest::keyword("ransomware group"), "ransomware group")]
    fn test_plan_single_field(#[case] request: InvestigationRequest, #[case] expected: &str) {
        let queries = plan_queries(&request);
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].text, expected);
    }

    #[test]
    fn test_plan_one_query_per_field() {
        let request = InvestigationRequest {
            phone_number: Some("555".into()),
            identifier: Some(" ".into()),
            cve: Some("CVE-2021-44228".into()),
            keyword: Some("log4shell".into()),
        };
        let fields: Vec<_> = plan_queries(&request).into_iter().map(|q| q.field).collect();
        assert_eq!(
            fields,
            vec![RequestField::Phone, RequestField::Cve, RequestField::Keyword]
        );
    }

    #[tokio::test]
    async fn test_duplicate_candidates_across_queries_are_visited_once() {
        let store = Arc::new(TaskStore::new());
        let tools = Arc::new(FixedTools {
            hits: vec!["https://a.example/1", "https://b.example/2", "https://a.example/1"],
            fail_search: false,
        });
        let agent = ResearchAgent::new(tools, Arc::clone(&store), 2);
        let id = store.create();

        let request = InvestigationRequest {
            cve: Some("CVE-2021-44228".into()),
            keyword: Some("log4shell".into()),
            ..Default::default()
        };
        agent.run(id, request).await;

        let status = store.get(id).unwrap();
        assert_eq!(status.state, TaskState::Completed);
        assert_eq!(status.findings.len(), 2);
        // The first query that surfaced a link is its extraction context.
        assert!(status
            .findings
            .iter()
            .all(|f| f.summary.starts_with("CVE-2021-44228")));
        let scraped = status
            .progress_log
            .iter()
            .filter(|e| e.message.contains("Scraped"))
            .count();
        assert_eq!(scraped, 2);
    }

    #[tokio::test]
    async fn test_failed_scrape_is_skipped() {
        let store = Arc::new(TaskStore::new());
        let tools = Arc::new(FixedTools {
            hits: vec!["https://bad.example/", "https://good.example/"],
            fail_search: false,
        });
        let agent = ResearchAgent::new(tools, Arc::clone(&store), 4);
        let id = store.create();

        agent.run(id, InvestigationRequest::keyword("test")).await;

        let status = store.get(id).unwrap();
        assert_eq!(status.state, TaskState::Completed);
        assert_eq!(status.findings.len(), 1);
        assert_eq!(status.findings[0].website_name, "good.example");
        assert!(status
            .progress_log
            .iter()
            .any(|e| e.message.contains("Scrape of https://bad.example/ failed")));
    }

    #[tokio::test]
    async fn test_total_search_failure_is_fatal() {
        let store = Arc::new(TaskStore::new());
        let tools = Arc::new(FixedTools {
            hits: vec![],
            fail_search: true,
        });
        let agent = ResearchAgent::new(tools, Arc::clone(&store), 4);
        let id = store.create();

        agent.run(id, InvestigationRequest::cve("CVE-2023-0001")).await;

        let status = store.get(id).unwrap();
        assert_eq!(status.state, TaskState::Error);
        assert!(status.findings.is_empty());
        assert!(!status.error_message.as_deref().unwrap_or("").is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_task_is_left_untouched() {
        let store = Arc::new(TaskStore::new());
        let tools = Arc::new(FixedTools {
            hits: vec!["https://a.example/"],
            fail_search: false,
        });
        let agent = ResearchAgent::new(tools, Arc::clone(&store), 1);
        let id = store.create();
        store.cancel(id).unwrap();
        let before = store.get(id).unwrap();

        agent.run(id, InvestigationRequest::keyword("x")).await;

        let after = store.get(id).unwrap();
        assert_eq!(after.state, TaskState::Cancelled);
        assert_eq!(after.progress_log, before.progress_log);
        assert!(after.findings.is_empty());
    }

    #[tokio::test]
    async fn test_every_phase_is_logged_in_order() {
        let store = Arc::new(TaskStore::new());
        let tools = Arc::new(FixedTools {
            hits: vec!["https://a.example/"],
            fail_search: false,
        });
        let agent = ResearchAgent::new(tools, Arc::clone(&store), 1);
        let id = store.create();

        agent.run(id, InvestigationRequest::keyword("x")).await;

        let messages: Vec<_> = store
            .get(id)
            .unwrap()
            .progress_log
            .iter()
            .map(|e| e.message.clone())
            .collect();
        let position = |needle: &str| {
            messages
                .iter()
                .position(|m| m.starts_with(needle))
                .unwrap_or_else(|| panic!("missing {:?} in {:?}", needle, messages))
        };
        let planning = position("Planning:");
        let searching = position("planning -> searching");
        let scraping = position("searching -> scraping");
        let extracting = position("scraping -> extracting");
        let finalizing = position("extracting -> finalizing");
        let done = position("finalizing -> done: task completed");
        assert!(planning < searching);
        assert!(searching < scraping);
        assert!(scraping < extracting);
        assert!(extracting < finalizing);
        assert!(finalizing < done);
    }
}
