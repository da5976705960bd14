//! Profile accumulator: applies completion events to a user's aggregate
//! profile, exactly once per task.
//!
//! `apply_completion` is pure and does one call's worth of increments.
//! Exactly-once is the caller's obligation and has two layers:
//! - the state machine only emits a completion on a task's first entry into
//!   `done` (`completed_at` is the durable marker);
//! - `CompletionLedger` dedupes retried deliveries of the same event, since
//!   the external store only offers at-least-once semantics under retry.

use std::collections::HashSet;

use crate::profile::UserProfile;

/// Rating tier for a completed-task count: every 10 completions raise the
/// tier by one, capped at 5.
pub fn rating_for(tasks_completed: u32) -> u8 {
    (tasks_completed / 10 + 1).min(5) as u8
}

/// Apply one completion: add the award, bump the count, recompute the tier.
pub fn apply_completion(profile: UserProfile, points: u32) -> UserProfile {
    let tasks_completed = profile.tasks_completed.saturating_add(1);
    UserProfile {
        reward_points: profile.reward_points.saturating_add(points),
        tasks_completed,
        rating: rating_for(tasks_completed),
        ..profile
    }
}

/// Idempotency guard keyed by task id.
///
/// `record` returns true exactly once per id; a retried completion for a task
/// already recorded comes back false and must not be applied again.
#[derive(Debug, Default, Clone)]
pub struct CompletionLedger {
    seen: HashSet<String>,
}

impl CompletionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, task_id: &str) -> bool {
        self.seen.insert(task_id.to_string())
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.seen.contains(task_id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
