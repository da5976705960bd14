//! Dashboard aggregator: read-only summary statistics over the task set
//! visible to one user.
//!
//! Recomputed from each snapshot the caller receives; no incremental state.

use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskStatus};

/// Bound on the recent-activity view.
pub const RECENT_TASKS_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    /// The user's tasks, most recently updated first, at most
    /// `RECENT_TASKS_LIMIT` entries.
    pub recent_tasks: Vec<Task>,
}

/// Summarize the tasks assigned to `for_user`.
pub fn summarize(tasks: &[Task], for_user: &str) -> DashboardStats {
    let mut mine: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.assigned_to.as_deref() == Some(for_user))
        .collect();

    let total_tasks = mine.len();
    let completed_tasks = mine.iter().filter(|t| t.status == TaskStatus::Done).count();
    let in_progress_tasks = mine
        .iter()
        .filter(|t| t.status == TaskStatus::InProgress)
        .count();

    // updated_at desc; id asc keeps equal timestamps deterministic.
    mine.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));

    DashboardStats {
        total_tasks,
        completed_tasks,
        in_progress_tasks,
        recent_tasks: mine
            .into_iter()
            .take(RECENT_TASKS_LIMIT)
            .cloned()
            .collect(),
    }
}
