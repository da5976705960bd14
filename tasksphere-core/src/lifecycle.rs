//! Task state machine: validates and applies status transitions, and decides
//! when a completion event fires.
//!
//! All four states are mutually reachable; the machine does not enforce
//! forward-only progression. The one guarded edge is into `done`: only the
//! current assignee may complete, and the completion event fires at most once
//! over the task's lifetime (`completed_at` is the durable marker, so a
//! reopened-then-redone task never re-awards).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::task::{Task, TaskStatus};

/// One-time signal that a task newly reached `done`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCompleted {
    pub task_id: String,
    pub user_id: String,
    pub completed_at: DateTime<Utc>,
}

/// Result of a transition: the updated task plus at most one completion event.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    pub task: Task,
    pub completion: Option<TaskCompleted>,
}

/// Apply a status transition.
///
/// Rejections happen before any field is touched:
/// - `NotAuthorized` when the target is `done` and `acting_user` is not the
///   current assignee (an unassigned task cannot be completed).
///
/// On first entry into `done` the outcome carries a `TaskCompleted` event and
/// the task gets `completed_at = now`. Every accepted transition, including a
/// re-select of the current status, stamps `updated_at = now`.
pub fn transition(
    mut task: Task,
    new_status: TaskStatus,
    acting_user: &str,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, Error> {
    if new_status == TaskStatus::Done && task.assigned_to.as_deref() != Some(acting_user) {
        return Err(Error::NotAuthorized {
            actor: acting_user.to_string(),
        });
    }

    let first_completion = new_status == TaskStatus::Done
        && task.status != TaskStatus::Done
        && task.completed_at.is_none();

    task.status = new_status;
    task.updated_at = now;

    let completion = if first_completion {
        task.completed_at = Some(now);
        Some(TaskCompleted {
            task_id: task.id.clone(),
            user_id: acting_user.to_string(),
            completed_at: now,
        })
    } else {
        None
    };

    Ok(TransitionOutcome { task, completion })
}

/// Reassign a task.
///
/// The prior assignee loses completion eligibility; points they already
/// earned from this task are untouched.
pub fn assign(mut task: Task, uid: &str, now: DateTime<Utc>) -> Task {
    task.assigned_to = Some(uid.to_string());
    task.updated_at = now;
    task
}
