//! End-to-end flows through `TaskService` + `MemoryStore`: completion awards,
//! exactly-once accounting under retries and outages, and live dashboards.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tasksphere_core::{Error as DomainError, Priority, TaskStatus};
use tasksphere_store::{
    decode_task, encode_task, Award, DocumentStore, FieldWrite, MemoryStore, NewTask, QuerySpec,
    ServiceError, StoreError, Subscription, TaskService, TASKS, USERS,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

async fn service_with_user(uid: &str) -> TaskService<MemoryStore> {
    let service = TaskService::new(MemoryStore::new());
    service
        .signup(uid, &format!("{uid}@tasksphere.com"), "Demo User", t0())
        .await
        .unwrap();
    service
}

#[tokio::test]
async fn completing_a_task_awards_points_exactly_once() {
    let service = service_with_user("u-dev").await;
    let task = service
        .create_task(
            NewTask::new("Design dashboard")
                .with_priority(Priority::High)
                .with_estimated_hours(8.0)
                .with_assignee("u-dev"),
            "u-admin",
            t0(),
        )
        .await
        .unwrap();

    let done_at = t0() + Duration::hours(3);
    let receipt = service
        .transition_task(&task.id, "done", "u-dev", done_at)
        .await
        .unwrap();
    assert_eq!(receipt.award, Award::Granted { points: 120 });
    assert_eq!(receipt.task.status, TaskStatus::Done);
    assert_eq!(receipt.task.completed_at, Some(done_at));

    let profile = service.profile("u-dev").await.unwrap();
    assert_eq!(profile.reward_points, 120);
    assert_eq!(profile.tasks_completed, 1);
    assert_eq!(profile.rating, 1);

    // Selecting done again only bumps updated_at.
    let later = done_at + Duration::hours(1);
    let receipt = service
        .transition_task(&task.id, "done", "u-dev", later)
        .await
        .unwrap();
    assert_eq!(receipt.award, Award::None);
    assert_eq!(receipt.task.completed_at, Some(done_at));
    assert_eq!(receipt.task.updated_at, later);
    assert_eq!(service.profile("u-dev").await.unwrap().reward_points, 120);
}

#[tokio::test]
async fn reopening_and_redoing_does_not_reaward() {
    let service = service_with_user("u-dev").await;
    let task = service
        .create_task(
            NewTask::new("Write docs").with_assignee("u-dev"),
            "u-admin",
            t0(),
        )
        .await
        .unwrap();

    let steps = [
        ("done", t0() + Duration::hours(1)),
        ("in-progress", t0() + Duration::hours(2)),
        ("done", t0() + Duration::hours(3)),
    ];
    let mut awards = Vec::new();
    for (status, at) in steps {
        let receipt = service
            .transition_task(&task.id, status, "u-dev", at)
            .await
            .unwrap();
        awards.push(receipt.award);
    }

    assert_eq!(awards[0], Award::Granted { points: 20 });
    assert_eq!(awards[1], Award::None);
    assert_eq!(awards[2], Award::None);

    let profile = service.profile("u-dev").await.unwrap();
    assert_eq!(profile.reward_points, 20);
    assert_eq!(profile.tasks_completed, 1);

    // completed_at still marks the first completion.
    let task = service.task(&task.id).await.unwrap();
    assert_eq!(task.completed_at, Some(t0() + Duration::hours(1)));
}

#[tokio::test]
async fn only_the_assignee_completes_and_nothing_is_written() {
    let service = service_with_user("u-dev").await;
    let task = service
        .create_task(
            NewTask::new("Review PR").with_assignee("u-dev"),
            "u-admin",
            t0(),
        )
        .await
        .unwrap();

    let err = service
        .transition_task(&task.id, "done", "u-intruder", t0() + Duration::hours(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::NotAuthorized { .. })
    ));

    let stored = service.task(&task.id).await.unwrap();
    assert_eq!(stored.status, TaskStatus::Todo);
    assert_eq!(stored.updated_at, t0());
    assert_eq!(service.profile("u-dev").await.unwrap().reward_points, 0);
}

#[tokio::test]
async fn unknown_status_is_rejected_before_any_io() {
    let service = service_with_user("u-dev").await;
    let err = service
        .transition_task("whatever", "archived", "u-dev", t0())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::InvalidTransition { .. })
    ));
}

#[tokio::test]
async fn non_done_moves_are_open_to_other_users() {
    let service = service_with_user("u-dev").await;
    let task = service
        .create_task(
            NewTask::new("User testing").with_assignee("u-dev"),
            "u-admin",
            t0(),
        )
        .await
        .unwrap();

    let receipt = service
        .transition_task(&task.id, "review", "u-manager", t0() + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(receipt.task.status, TaskStatus::Review);
    assert_eq!(receipt.award, Award::None);
}

#[tokio::test]
async fn missing_task_is_reported_by_id() {
    let service = service_with_user("u-dev").await;
    let err = service
        .transition_task("ghost", "done", "u-dev", t0())
        .await
        .unwrap_err();
    match err {
        ServiceError::TaskNotFound(id) => assert_eq!(id, "ghost"),
        other => panic!("expected TaskNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn signup_rejects_malformed_emails() {
    let service = TaskService::new(MemoryStore::new());
    let err = service
        .signup("u1", "not-an-email", "Demo User", t0())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidEmail(_)));
}

#[tokio::test]
async fn pre_assigned_tasks_may_start_in_progress() {
    let service = service_with_user("u-dev").await;

    let started = service
        .create_task(
            NewTask::new("Hotfix")
                .with_assignee("u-dev")
                .starting_in_progress(),
            "u-admin",
            t0(),
        )
        .await
        .unwrap();
    assert_eq!(started.status, TaskStatus::InProgress);

    // Unassigned tasks always start in todo.
    let unassigned = service
        .create_task(
            NewTask::new("Backlog item").starting_in_progress(),
            "u-admin",
            t0(),
        )
        .await
        .unwrap();
    assert_eq!(unassigned.status, TaskStatus::Todo);
}

#[tokio::test]
async fn reassignment_moves_completion_eligibility() {
    let service = service_with_user("u-dev").await;
    service
        .signup("u-new", "u-new@tasksphere.com", "New Dev", t0())
        .await
        .unwrap();

    let task = service
        .create_task(
            NewTask::new("Handover").with_assignee("u-dev"),
            "u-admin",
            t0(),
        )
        .await
        .unwrap();
    service
        .assign_task(&task.id, "u-new", t0() + Duration::hours(1))
        .await
        .unwrap();

    let err = service
        .transition_task(&task.id, "done", "u-dev", t0() + Duration::hours(2))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Domain(DomainError::NotAuthorized { .. })
    ));

    let receipt = service
        .transition_task(&task.id, "done", "u-new", t0() + Duration::hours(3))
        .await
        .unwrap();
    assert_eq!(receipt.award, Award::Granted { points: 20 });
    assert_eq!(service.profile("u-new").await.unwrap().tasks_completed, 1);
}

#[tokio::test]
async fn dashboard_stats_follow_the_live_task_set() {
    let service = service_with_user("u-dev").await;
    let mut ids = Vec::new();
    for (i, title) in ["a", "b", "c"].iter().enumerate() {
        let task = service
            .create_task(
                NewTask::new(*title).with_assignee("u-dev"),
                "u-admin",
                t0() + Duration::minutes(i as i64),
            )
            .await
            .unwrap();
        ids.push(task.id);
    }

    let mut watch = service.watch_dashboard("u-dev").await.unwrap();
    let stats = watch.current().unwrap();
    assert_eq!(stats.total_tasks, 3);
    assert_eq!(stats.completed_tasks, 0);

    service
        .transition_task(&ids[0], "done", "u-dev", t0() + Duration::hours(1))
        .await
        .unwrap();
    assert!(watch.changed().await);

    let stats = watch.current().unwrap();
    assert_eq!(stats.total_tasks, 3);
    assert_eq!(stats.completed_tasks, 1);
    // The completed task was touched last, so it leads the recent view.
    assert_eq!(stats.recent_tasks[0].id, ids[0]);

    watch.unsubscribe();
}

#[tokio::test]
async fn ledger_blocks_an_externally_reset_task_from_double_counting() {
    let service = service_with_user("u-dev").await;
    let task = service
        .create_task(
            NewTask::new("Fragile").with_assignee("u-dev"),
            "u-admin",
            t0(),
        )
        .await
        .unwrap();

    let receipt = service
        .transition_task(&task.id, "done", "u-dev", t0() + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(receipt.award, Award::Granted { points: 20 });

    // Out-of-band editor wipes the completion marker and reopens the task.
    let mut reset = decode_task(
        service
            .store()
            .get(TASKS, &task.id)
            .await
            .unwrap()
            .unwrap(),
    )
    .unwrap();
    reset.status = TaskStatus::InProgress;
    reset.completed_at = None;
    service
        .store()
        .set(TASKS, &reset.id, encode_task(&reset).unwrap())
        .await
        .unwrap();

    let receipt = service
        .transition_task(&task.id, "done", "u-dev", t0() + Duration::hours(2))
        .await
        .unwrap();
    assert_eq!(receipt.award, Award::AlreadyCounted);

    let profile = service.profile("u-dev").await.unwrap();
    assert_eq!(profile.reward_points, 20);
    assert_eq!(profile.tasks_completed, 1);
}

/// Store wrapper that can black-hole profile writes, for exercising the
/// task-committed-but-award-failed window.
#[derive(Clone)]
struct FlakyStore {
    inner: MemoryStore,
    fail_profile_updates: Arc<AtomicBool>,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_profile_updates: Arc::new(AtomicBool::new(false)),
        }
    }

    fn set_outage(&self, on: bool) {
        self.fail_profile_updates.store(on, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl DocumentStore for FlakyStore {
    async fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        doc: serde_json::Value,
    ) -> Result<(), StoreError> {
        self.inner.set(collection, id, doc).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Vec<(String, FieldWrite)>,
    ) -> Result<(), StoreError> {
        if collection == USERS && self.fail_profile_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        self.inner.update(collection, id, fields).await
    }

    async fn insert(
        &self,
        collection: &str,
        doc: serde_json::Value,
    ) -> Result<String, StoreError> {
        self.inner.insert(collection, doc).await
    }

    async fn query(
        &self,
        collection: &str,
        spec: &QuerySpec,
    ) -> Result<Vec<serde_json::Value>, StoreError> {
        self.inner.query(collection, spec).await
    }

    async fn subscribe(
        &self,
        collection: &str,
        spec: QuerySpec,
    ) -> Result<Subscription, StoreError> {
        self.inner.subscribe(collection, spec).await
    }
}

#[tokio::test]
async fn failed_award_is_queued_until_an_explicit_reconcile() {
    let store = FlakyStore::new();
    let service = TaskService::new(store.clone());
    service
        .signup("u-dev", "u-dev@tasksphere.com", "Demo User", t0())
        .await
        .unwrap();
    let task = service
        .create_task(
            NewTask::new("Implement reward system")
                .with_priority(Priority::High)
                .with_estimated_hours(8.0)
                .with_assignee("u-dev"),
            "u-admin",
            t0(),
        )
        .await
        .unwrap();

    store.set_outage(true);
    let receipt = service
        .transition_task(&task.id, "done", "u-dev", t0() + Duration::hours(1))
        .await
        .unwrap();
    assert_eq!(receipt.award, Award::Pending { points: 120 });

    // The task is visibly done while the points wait for reconciliation.
    let stored = service.task(&task.id).await.unwrap();
    assert_eq!(stored.status, TaskStatus::Done);
    assert_eq!(service.profile("u-dev").await.unwrap().reward_points, 0);
    assert_eq!(service.pending_awards().await.len(), 1);

    // Still failing: the award stays queued.
    let report = service.reconcile().await;
    assert!(report.applied.is_empty());
    assert_eq!(report.still_pending.len(), 1);

    store.set_outage(false);
    let report = service.reconcile().await;
    assert_eq!(report.applied.len(), 1);
    assert!(report.still_pending.is_empty());

    let profile = service.profile("u-dev").await.unwrap();
    assert_eq!(profile.reward_points, 120);
    assert_eq!(profile.tasks_completed, 1);

    // Reconcile is safe to call with an empty queue.
    let report = service.reconcile().await;
    assert!(report.applied.is_empty());
    assert!(service.pending_awards().await.is_empty());
    assert_eq!(service.profile("u-dev").await.unwrap().reward_points, 120);
}
