use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tasksphere_core::{Priority, Task, TaskStatus};

/// Normalized output of the task CSV parser (store-agnostic: no id yet, the
/// document store assigns one on insert).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSeed {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub estimated_hours: Option<f64>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<String>,
}

impl TaskSeed {
    /// Build a core task from this seed. Due dates land at end of day UTC.
    pub fn into_task(self, id: impl Into<String>, created_by: &str, now: DateTime<Utc>) -> Task {
        let mut task = Task::new(id, self.title, created_by, now)
            .with_description(self.description)
            .with_priority(self.priority)
            .with_status(self.status);
        if let Some(h) = self.estimated_hours {
            task = task.with_estimated_hours(h);
        }
        if let Some(due) = self.due_date {
            if let Some(end_of_day) = due.and_hms_opt(23, 59, 59) {
                task = task.with_due_date(end_of_day.and_utc());
            }
        }
        if let Some(uid) = self.assigned_to {
            task = task.with_assignee(uid);
        }
        task
    }
}
