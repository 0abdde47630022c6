//! Finding Accumulator
//!
//! Collects findings for a task, keyed by `source_link`. A later finding for
//! a link already present replaces it (last write wins). Findings are kept in
//! ascending `date_found` order; equal timestamps keep insertion order.

use crate::research::store::TaskStore;
use crate::types::{Finding, Result, TaskId};
use std::sync::Arc;

/// Upsert `finding` into `findings`, preserving the ordering invariant.
///
/// A replaced finding is re-positioned as if newly inserted at its new
/// timestamp.
pub(crate) fn merge_finding(findings: &mut Vec<Finding>, finding: Finding) {
    findings.retain(|existing| existing.source_link != finding.source_link);
    let at = findings.partition_point(|existing| existing.date_found <= finding.date_found);
    findings.insert(at, finding);
}

/// Per-store handle for adding and reading findings.
#[derive(Clone)]
pub struct FindingAccumulator {
    store: Arc<TaskStore>,
}

impl FindingAccumulator {
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }

    /// Upsert by `source_link`. Ignored once the task is terminal.
    pub fn add(&self, task_id: TaskId, finding: Finding) -> Result<()> {
        self.store.upsert_finding(task_id, finding)?;
        Ok(())
    }

    /// Findings ordered by ascending `date_found`, ties by insertion order.
    pub fn snapshot(&self, task_id: TaskId) -> Result<Vec<Finding>> {
        Ok(self.store.get(task_id)?.findings.clone())
    }
}
