#![allow(dead_code)]

pub mod mocks;

use sentinel::research::TaskDispatcher;
use sentinel::types::{TaskId, TaskStatus};
use std::sync::Arc;
use std::time::Duration;

/// Poll `task_id` until it reaches a terminal state, checking on every poll
/// that the progress log only ever grows by appending.
pub async fn wait_for_terminal(dispatcher: &TaskDispatcher, task_id: TaskId) -> Arc<TaskStatus> {
    let mut previous = dispatcher.poll(task_id).expect("task exists");
    for _ in 0..500 {
        let current = dispatcher.poll(task_id).expect("task exists");
        assert!(
            current.progress_log.len() >= previous.progress_log.len(),
            "progress log shrank"
        );
        assert_eq!(
            &current.progress_log[..previous.progress_log.len()],
            &previous.progress_log[..],
            "progress log prefix was rewritten"
        );
        if current.is_terminal() {
            return current;
        }
        previous = current;
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("task {} did not reach a terminal state", task_id);
}

/// Whether any progress entry contains `needle`.
pub fn log_contains(status: &TaskStatus, needle: &str) -> bool {
    status.progress_log.iter().any(|e| e.message.contains(needle))
}
