//! Task State Store
//!
//! Process-lifetime registry of task status records. Each task has its own
//! write lock, so mutations to one task are serialized while other tasks
//! proceed independently. Every mutation publishes a fresh immutable
//! [`TaskStatus`] through an [`ArcSwap`]; readers load the latest snapshot
//! without ever waiting on a writer.
//!
//! The registry itself is also published through an `ArcSwap`. Only
//! `create` takes a lock; looking a task up is a single atomic load.

use crate::research::accumulator::merge_finding;
use crate::types::{AppError, Finding, LogEntry, Result, TaskId, TaskState, TaskStatus};
use arc_swap::ArcSwap;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

type Registry = HashMap<TaskId, Arc<TaskSlot>>;

struct TaskSlot {
    /// Held for the duration of a read-modify-publish cycle
    write: Mutex<()>,
    snapshot: ArcSwap<TaskStatus>,
}

impl TaskSlot {
    fn new(status: TaskStatus) -> Self {
        Self {
            write: Mutex::new(()),
            snapshot: ArcSwap::from_pointee(status),
        }
    }
}

/// Registry mapping [`TaskId`] to its status record.
///
/// Create one per process (or per test) and share it behind an `Arc`.
pub struct TaskStore {
    tasks: ArcSwap<Registry>,
    /// Serializes registry publication between concurrent `create` calls
    create_lock: Mutex<()>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self {
            tasks: ArcSwap::from_pointee(Registry::new()),
            create_lock: Mutex::new(()),
        }
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new task in the `pending` state.
    pub fn create(&self) -> TaskId {
        let _guard = self.create_lock.lock();
        let mut tasks = Registry::clone(&self.tasks.load());
        let mut id = TaskId::new();
        while tasks.contains_key(&id) {
            id = TaskId::new();
        }
        tasks.insert(id, Arc::new(TaskSlot::new(TaskStatus::new(id))));
        self.tasks.store(Arc::new(tasks));
        id
    }

    /// Latest published snapshot of a task.
    pub fn get(&self, id: TaskId) -> Result<Arc<TaskStatus>> {
        Ok(self.slot(id)?.snapshot.load_full())
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.load().contains_key(&id)
    }

    pub fn is_terminal(&self, id: TaskId) -> Result<bool> {
        Ok(self.slot(id)?.snapshot.load().is_terminal())
    }

    pub fn len(&self) -> usize {
        self.tasks.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move a task forward. Backward moves, repeated states and any change
    /// to a terminal task are ignored. Returns whether the state changed.
    pub fn transition(&self, id: TaskId, next: TaskState) -> Result<bool> {
        self.mutate(id, |status| {
            if !status.state.can_advance_to(next) {
                return false;
            }
            status.state = next;
            true
        })
    }

    /// Append one progress entry. Returns `false` if the task is terminal.
    pub fn append_log(&self, id: TaskId, message: impl Into<String>) -> Result<bool> {
        let message = message.into();
        self.mutate(id, move |status| {
            // Stamped under the write lock so timestamps follow log order.
            status.progress_log.push(LogEntry::now(message));
            true
        })
    }

    /// Force the task into `error` with `detail`. No effect on terminal tasks.
    pub fn set_error(&self, id: TaskId, detail: impl Into<String>) -> Result<bool> {
        let detail = detail.into();
        self.mutate(id, move |status| {
            status.state = TaskState::Error;
            status.error_message = Some(detail);
            true
        })
    }

    /// Force the task into `cancelled`. No effect on terminal tasks.
    pub fn cancel(&self, id: TaskId) -> Result<bool> {
        self.mutate(id, |status| {
            status.progress_log.push(LogEntry::now("Task cancelled."));
            status.state = TaskState::Cancelled;
            true
        })
    }

    /// Insert or replace the finding keyed by its `source_link`.
    pub fn upsert_finding(&self, id: TaskId, finding: Finding) -> Result<bool> {
        self.mutate(id, move |status| {
            merge_finding(&mut status.findings, finding);
            true
        })
    }

    fn slot(&self, id: TaskId) -> Result<Arc<TaskSlot>> {
        self.tasks
            .load()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Unknown task_id: {}", id)))
    }

    /// Serialized read-modify-publish. `apply` returns whether it changed
    /// anything; nothing is published otherwise.
    fn mutate<F>(&self, id: TaskId, apply: F) -> Result<bool>
    where
        F: FnOnce(&mut TaskStatus) -> bool,
    {
        let slot = self.slot(id)?;
        let _guard = slot.write.lock();

        let current = slot.snapshot.load_full();
        if current.is_terminal() {
            return Ok(false);
        }

        let mut next = TaskStatus::clone(&current);
        if !apply(&mut next) {
            return Ok(false);
        }
        next.updated_at = Utc::now();
        slot.snapshot.store(Arc::new(next));
        Ok(true)
    }
}
