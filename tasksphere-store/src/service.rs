//! Orchestration service: wires the pure engine to the document store.
//!
//! One `transition_task` call runs the state machine, persists the task, then
//! applies the reward. The task and profile live in separate documents and
//! nothing makes the pair atomic: when the task write commits but the profile
//! write fails, the award is queued here and only applied through an explicit
//! `reconcile` call. Whatever hosts this service across restarts must persist
//! that obligation; in-process, `pending_awards` exposes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use tasksphere_core::{
    apply_completion, is_valid_email, lifecycle, points_for, summarize, CompletionLedger,
    DashboardStats, Error as DomainError, Priority, Task, TaskStatus, UserProfile,
};

use crate::document::{decode_profile, decode_task, encode_profile, encode_task, TASKS, USERS};
use crate::store::{DocumentStore, FieldWrite, QuerySpec, StoreError, Subscription};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("task `{0}` not found")]
    TaskNotFound(String),

    #[error("invalid email address `{0}`")]
    InvalidEmail(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Creation input; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub estimated_hours: Option<f64>,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,
    pub project_id: Option<String>,
    /// Start in `in-progress` instead of `todo`; only honored when the task
    /// is pre-assigned.
    pub start_in_progress: bool,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority: Priority::Medium,
            estimated_hours: None,
            due_date: None,
            assigned_to: None,
            project_id: None,
            start_in_progress: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_estimated_hours(mut self, hours: f64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    pub fn with_due_date(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_assignee(mut self, uid: impl Into<String>) -> Self {
        self.assigned_to = Some(uid.into());
        self
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn starting_in_progress(mut self) -> Self {
        self.start_in_progress = true;
        self
    }
}

/// What happened to the reward side of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Award {
    /// Points landed on the assignee's profile.
    Granted { points: u32 },
    /// The transition did not newly complete the task.
    None,
    /// This task's completion was already counted (retried delivery).
    AlreadyCounted,
    /// Task write committed but the profile write failed; queued for
    /// `reconcile`.
    Pending { points: u32 },
}

/// Outcome surfaced to the caller so a UI can tell applied from in-flight.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionReceipt {
    pub task: Task,
    pub award: Award,
}

/// A reward owed but not yet applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAward {
    pub task_id: String,
    pub uid: String,
    pub points: u32,
}

#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub applied: Vec<PendingAward>,
    pub still_pending: Vec<PendingAward>,
}

pub struct TaskService<S> {
    store: S,
    ledger: Mutex<CompletionLedger>,
    pending: Mutex<Vec<PendingAward>>,
}

impl<S: DocumentStore> TaskService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            ledger: Mutex::new(CompletionLedger::new()),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn create_task(
        &self,
        new_task: NewTask,
        creator: &str,
        now: DateTime<Utc>,
    ) -> Result<Task, ServiceError> {
        let status = if new_task.start_in_progress && new_task.assigned_to.is_some() {
            TaskStatus::InProgress
        } else {
            TaskStatus::Todo
        };

        let mut task = Task::new("", new_task.title, creator, now)
            .with_description(new_task.description)
            .with_priority(new_task.priority)
            .with_status(status);
        if let Some(h) = new_task.estimated_hours {
            task = task.with_estimated_hours(h);
        }
        if let Some(due) = new_task.due_date {
            task = task.with_due_date(due);
        }
        if let Some(uid) = new_task.assigned_to {
            task = task.with_assignee(uid);
        }
        if let Some(project_id) = new_task.project_id {
            task = task.with_project(project_id);
        }

        let id = self.store.insert(TASKS, encode_task(&task)?).await?;
        task.id = id;
        info!(task_id = %task.id, status = %task.status, "task created");
        Ok(task)
    }

    pub async fn signup(
        &self,
        uid: &str,
        email: &str,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<UserProfile, ServiceError> {
        if !is_valid_email(email) {
            return Err(ServiceError::InvalidEmail(email.to_string()));
        }
        let profile = UserProfile::signup(uid, email, display_name, now);
        self.store
            .set(USERS, &profile.uid, encode_profile(&profile)?)
            .await?;
        info!(uid = %profile.uid, "profile created");
        Ok(profile)
    }

    pub async fn task(&self, task_id: &str) -> Result<Task, ServiceError> {
        let doc = self
            .store
            .get(TASKS, task_id)
            .await?
            .ok_or_else(|| ServiceError::TaskNotFound(task_id.to_string()))?;
        Ok(decode_task(doc)?)
    }

    pub async fn profile(&self, uid: &str) -> Result<UserProfile, ServiceError> {
        let doc = self.store.get(USERS, uid).await?.ok_or_else(|| {
            ServiceError::Domain(DomainError::ProfileNotFound {
                uid: uid.to_string(),
            })
        })?;
        Ok(decode_profile(doc)?)
    }

    /// Tasks, most recently updated first, optionally scoped to one assignee.
    pub async fn tasks(&self, assigned_to: Option<&str>) -> Result<Vec<Task>, ServiceError> {
        let mut spec = QuerySpec::new().order_by_desc("updatedAt");
        if let Some(uid) = assigned_to {
            spec = spec.filter("assignedTo", uid);
        }
        let docs = self.store.query(TASKS, &spec).await?;
        Ok(docs
            .into_iter()
            .map(decode_task)
            .collect::<Result<Vec<_>, _>>()?)
    }

    pub async fn assign_task(
        &self,
        task_id: &str,
        uid: &str,
        now: DateTime<Utc>,
    ) -> Result<Task, ServiceError> {
        let task = self.task(task_id).await?;
        let task = lifecycle::assign(task, uid, now);
        self.store
            .set(TASKS, &task.id, encode_task(&task)?)
            .await?;
        info!(task_id = %task.id, uid = %uid, "task reassigned");
        Ok(task)
    }

    /// Apply a status transition end to end.
    ///
    /// Pure rejections (`InvalidTransition`, `NotAuthorized`) surface before
    /// any write. The task write happens first; a completion then flows
    /// through the idempotency ledger into the profile counters.
    pub async fn transition_task(
        &self,
        task_id: &str,
        new_status: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<TransitionReceipt, ServiceError> {
        let status: TaskStatus = new_status.parse()?;

        let task = self.task(task_id).await?;
        let outcome = lifecycle::transition(task, status, actor, now)?;

        self.store
            .set(TASKS, &outcome.task.id, encode_task(&outcome.task)?)
            .await?;
        info!(task_id = %outcome.task.id, status = %outcome.task.status, actor = %actor, "transition applied");

        let award = match &outcome.completion {
            None => Award::None,
            Some(event) => {
                let fresh = self.ledger.lock().await.record(&event.task_id);
                if !fresh {
                    Award::AlreadyCounted
                } else {
                    let points = points_for(&outcome.task);
                    match self.apply_award(&event.user_id, points).await {
                        Ok(()) => {
                            info!(uid = %event.user_id, points, task_id = %event.task_id, "reward applied");
                            Award::Granted { points }
                        }
                        Err(err) => {
                            warn!(
                                uid = %event.user_id,
                                points,
                                task_id = %event.task_id,
                                error = %err,
                                "profile award failed; queued for reconcile"
                            );
                            self.pending.lock().await.push(PendingAward {
                                task_id: event.task_id.clone(),
                                uid: event.user_id.clone(),
                                points,
                            });
                            Award::Pending { points }
                        }
                    }
                }
            }
        };

        Ok(TransitionReceipt {
            task: outcome.task,
            award,
        })
    }

    async fn apply_award(&self, uid: &str, points: u32) -> Result<(), ServiceError> {
        let profile = self.profile(uid).await?;

        // One atomic document write: counters go through store-side
        // increments so concurrent completions of different tasks cannot lose
        // updates, and a retried write can never land half-applied. The
        // rating tier is recomputed from the read snapshot; a concurrent
        // completion can leave it one tier stale until the next completion
        // rewrites it.
        let updated = apply_completion(profile, points);
        self.store
            .update(
                USERS,
                uid,
                vec![
                    (
                        "rewardPoints".to_string(),
                        FieldWrite::Increment(i64::from(points)),
                    ),
                    ("tasksCompleted".to_string(), FieldWrite::Increment(1)),
                    ("rating".to_string(), FieldWrite::Set(json!(updated.rating))),
                ],
            )
            .await?;
        Ok(())
    }

    /// Awards owed but not yet applied (task committed, profile write failed).
    pub async fn pending_awards(&self) -> Vec<PendingAward> {
        self.pending.lock().await.clone()
    }

    /// Re-queue awards a previous process left unapplied. Their task ids are
    /// recorded in the ledger so a replayed transition cannot count them a
    /// second time.
    pub async fn restore_pending(&self, awards: Vec<PendingAward>) {
        let mut ledger = self.ledger.lock().await;
        for award in &awards {
            ledger.record(&award.task_id);
        }
        drop(ledger);
        self.pending.lock().await.extend(awards);
    }

    /// Explicitly retry queued awards. Safe to call repeatedly: each award is
    /// applied at most once because it only enters the queue after its ledger
    /// entry was recorded.
    pub async fn reconcile(&self) -> ReconcileReport {
        let queued = {
            let mut pending = self.pending.lock().await;
            std::mem::take(&mut *pending)
        };

        let mut report = ReconcileReport::default();
        for award in queued {
            match self.apply_award(&award.uid, award.points).await {
                Ok(()) => {
                    info!(uid = %award.uid, points = award.points, task_id = %award.task_id, "queued reward applied");
                    report.applied.push(award);
                }
                Err(err) => {
                    warn!(uid = %award.uid, task_id = %award.task_id, error = %err, "queued reward still failing");
                    report.still_pending.push(award);
                }
            }
        }

        if !report.still_pending.is_empty() {
            self.pending
                .lock()
                .await
                .extend(report.still_pending.iter().cloned());
        }
        report
    }

    pub async fn dashboard(&self, for_user: &str) -> Result<DashboardStats, ServiceError> {
        let spec = QuerySpec::new().filter("assignedTo", for_user);
        let docs = self.store.query(TASKS, &spec).await?;
        let tasks = docs
            .into_iter()
            .map(decode_task)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summarize(&tasks, for_user))
    }

    /// Live dashboard: stats recomputed from every store snapshot.
    pub async fn watch_dashboard(&self, for_user: &str) -> Result<DashboardWatch, ServiceError> {
        let spec = QuerySpec::new().filter("assignedTo", for_user);
        let sub = self.store.subscribe(TASKS, spec).await?;
        Ok(DashboardWatch {
            sub,
            for_user: for_user.to_string(),
        })
    }
}

/// Cancellable live view over one user's dashboard.
pub struct DashboardWatch {
    sub: Subscription,
    for_user: String,
}

impl DashboardWatch {
    /// Stats derived from the latest snapshot.
    pub fn current(&self) -> Result<DashboardStats, ServiceError> {
        let tasks = self
            .sub
            .snapshot()
            .into_iter()
            .map(decode_task)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summarize(&tasks, &self.for_user))
    }

    /// Wait for the next snapshot. Returns false once the store side is gone.
    pub async fn changed(&mut self) -> bool {
        self.sub.changed().await
    }

    pub fn unsubscribe(self) {
        self.sub.unsubscribe()
    }
}
