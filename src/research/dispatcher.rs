//! Task Dispatcher
//!
//! Admission, background scheduling and snapshot reads. `submit` never
//! waits on the research itself: it validates, allocates a task and spawns
//! the agent onto the tokio runtime.
//!
//! The fan-out limit is fixed per task at submission. A dispatcher built
//! with [`TaskDispatcher::with_config`] reads it from the live configuration,
//! so a reloaded `agent.max_concurrency` applies to the next submitted task.

use crate::research::agent::ResearchAgent;
use crate::research::store::TaskStore;
use crate::tools::ToolClient;
use crate::types::{InvestigationRequest, Result, TaskId, TaskStatus};
use crate::utils::toml_config::SentinelConfigManager;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
enum ConcurrencyLimit {
    Fixed(usize),
    Live(Arc<SentinelConfigManager>),
}

#[derive(Clone)]
pub struct TaskDispatcher {
    store: Arc<TaskStore>,
    tools: Arc<dyn ToolClient>,
    limit: ConcurrencyLimit,
}

impl TaskDispatcher {
    pub fn new(store: Arc<TaskStore>, tools: Arc<dyn ToolClient>, max_concurrency: usize) -> Self {
        Self {
            store,
            tools,
            limit: ConcurrencyLimit::Fixed(max_concurrency),
        }
    }

    /// Dispatcher whose fan-out limit follows `config.agent.max_concurrency`.
    pub fn with_config(
        store: Arc<TaskStore>,
        tools: Arc<dyn ToolClient>,
        config: Arc<SentinelConfigManager>,
    ) -> Self {
        Self {
            store,
            tools,
            limit: ConcurrencyLimit::Live(config),
        }
    }

    /// Fan-out limit a task submitted now would run with.
    pub fn max_concurrency(&self) -> usize {
        match &self.limit {
            ConcurrencyLimit::Fixed(limit) => *limit,
            ConcurrencyLimit::Live(config) => config.config().agent.max_concurrency,
        }
    }

    /// Validate `request`, create its task and start the agent in the
    /// background. Must be called from within a tokio runtime.
    ///
    /// An empty request fails with [`AppError::InvalidInput`](crate::types::AppError)
    /// and no task is created.
    pub fn submit(&self, request: InvestigationRequest) -> Result<TaskId> {
        request.validate()?;

        let max_concurrency = self.max_concurrency();
        let task_id = self.store.create();
        info!(
            task_id = %task_id,
            fields = request.present_fields().len(),
            max_concurrency,
            "Task accepted"
        );

        let agent = ResearchAgent::new(
            Arc::clone(&self.tools),
            Arc::clone(&self.store),
            max_concurrency,
        );
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            let run = tokio::spawn(async move { agent.run(task_id, request).await });
            if let Err(join_error) = run.await {
                // The agent panicked or was aborted; make sure pollers still
                // observe a terminal state.
                error!(task_id = %task_id, error = %join_error, "Research agent terminated abnormally");
                let detail = format!("internal error: research agent terminated: {}", join_error);
                let _ = store.append_log(task_id, format!("Task failed: {}", detail));
                let _ = store.set_error(task_id, detail);
            }
        });

        Ok(task_id)
    }

    /// Latest snapshot of a task, or `NotFound`.
    pub fn poll(&self, task_id: TaskId) -> Result<Arc<TaskStatus>> {
        self.store.get(task_id)
    }

    /// Cancel a running task. Cancelling a terminal task returns its
    /// snapshot unchanged.
    pub fn cancel(&self, task_id: TaskId) -> Result<Arc<TaskStatus>> {
        if self.store.cancel(task_id)? {
            info!(task_id = %task_id, "Task cancelled");
        }
        self.store.get(task_id)
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }
}
