//! Typed boundary over duck-typed store documents.
//!
//! Documents arrive as loose JSON; they become `Task`/`UserProfile` here or
//! fail with a `Corrupt` error naming the offending field, so nothing loose
//! leaks past this module.

use serde_json::Value;

use tasksphere_core::{Task, UserProfile};

use crate::store::StoreError;

pub const TASKS: &str = "tasks";
pub const USERS: &str = "users";

pub fn decode_task(doc: Value) -> Result<Task, StoreError> {
    serde_json::from_value(doc).map_err(|err| StoreError::Corrupt {
        collection: TASKS.to_string(),
        reason: err.to_string(),
    })
}

pub fn encode_task(task: &Task) -> Result<Value, StoreError> {
    serde_json::to_value(task).map_err(|err| StoreError::Corrupt {
        collection: TASKS.to_string(),
        reason: err.to_string(),
    })
}

pub fn decode_profile(doc: Value) -> Result<UserProfile, StoreError> {
    serde_json::from_value(doc).map_err(|err| StoreError::Corrupt {
        collection: USERS.to_string(),
        reason: err.to_string(),
    })
}

pub fn encode_profile(profile: &UserProfile) -> Result<Value, StoreError> {
    serde_json::to_value(profile).map_err(|err| StoreError::Corrupt {
        collection: USERS.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use tasksphere_core::{Priority, TaskStatus};

    #[test]
    fn task_documents_round_trip() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let task = Task::new("t1", "Design dashboard", "u-admin", now)
            .with_priority(Priority::High)
            .with_estimated_hours(8.0)
            .with_assignee("u-dev");

        let doc = encode_task(&task).unwrap();
        assert_eq!(decode_task(doc).unwrap(), task);
    }

    #[test]
    fn decode_accepts_wire_shaped_documents() {
        let doc = json!({
            "id": "t9",
            "title": "User testing",
            "description": "Conduct sessions and gather feedback",
            "status": "review",
            "priority": "medium",
            "estimatedHours": 4,
            "createdBy": "u-admin",
            "assignedTo": "u-dev",
            "createdAt": "2026-03-01T09:00:00Z",
            "updatedAt": "2026-03-02T10:30:00Z"
        });
        let task = decode_task(doc).unwrap();
        assert_eq!(task.status, TaskStatus::Review);
        assert_eq!(task.estimated_hours, Some(4.0));
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn decode_rejects_missing_required_fields() {
        let err = decode_task(json!({"id": "t1", "title": "no status"})).unwrap_err();
        match err {
            StoreError::Corrupt { collection, reason } => {
                assert_eq!(collection, TASKS);
                assert!(reason.contains("status") || reason.contains("missing"));
            }
            other => panic!("expected Corrupt, got {other:?}"),
        }
    }

    #[test]
    fn decode_rejects_unknown_status_value() {
        let err = decode_task(json!({
            "id": "t1",
            "title": "bad status",
            "status": "archived",
            "priority": "low",
            "createdBy": "u1",
            "createdAt": "2026-03-01T09:00:00Z",
            "updatedAt": "2026-03-01T09:00:00Z"
        }))
        .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn profile_documents_round_trip() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let profile = UserProfile::signup("u1", "john@tasksphere.com", "John Smith", now);
        let doc = encode_profile(&profile).unwrap();
        assert_eq!(doc["displayName"], "John Smith");
        assert_eq!(decode_profile(doc).unwrap(), profile);
    }
}
