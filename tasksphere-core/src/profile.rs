//! User profile: the aggregate the reward accounting writes into.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Aggregate per-user counters.
///
/// `reward_points` and `tasks_completed` only move through
/// `accumulator::apply_completion`. `projects_completed` is maintained by the
/// project side of the system and carried through untouched here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub display_name: String,

    pub reward_points: u32,
    pub tasks_completed: u32,
    /// 0-5 tier derived from `tasks_completed`; 0 only before the first
    /// completion.
    pub rating: u8,
    pub projects_completed: u32,

    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Fresh profile at signup: all counters zero.
    pub fn signup(
        uid: impl Into<String>,
        email: impl Into<String>,
        display_name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            display_name: display_name.into(),
            reward_points: 0,
            tasks_completed: 0,
            rating: 0,
            projects_completed: 0,
            created_at: now,
        }
    }
}

/// Shape check only; deliverability belongs to the identity provider.
pub fn is_valid_email(email: &str) -> bool {
    match Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$") {
        Ok(re) => re.is_match(email),
        Err(_) => false,
    }
}
