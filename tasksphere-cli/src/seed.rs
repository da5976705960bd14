//! Built-in demo data and CSV import, the CLI counterpart of the product's
//! one-off seed scripts.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

use tasksphere_core::{rating_for, Priority, Task, TaskStatus};
use tasksphere_ingest::parse_tasks_csv;
use tasksphere_store::{encode_task, DocumentStore, FieldWrite, TaskService, TASKS, USERS};

/// Three demo users plus a small spread of tasks across the lifecycle.
pub async fn seed_demo<S: DocumentStore>(
    service: &TaskService<S>,
    now: DateTime<Utc>,
) -> Result<()> {
    let users: [(&str, &str, &str, u32, u32); 3] = [
        ("u-demo", "demo@tasksphere.com", "Demo User", 150, 25),
        ("u-john", "john@tasksphere.com", "John Smith", 320, 45),
        ("u-sarah", "sarah@tasksphere.com", "Sarah Johnson", 280, 38),
    ];
    for (uid, email, name, points, completed) in users {
        service.signup(uid, email, name, now).await?;
        // Preset history, written directly the way the seed scripts did.
        service
            .store()
            .update(
                USERS,
                uid,
                vec![
                    ("rewardPoints".to_string(), FieldWrite::Set(points.into())),
                    (
                        "tasksCompleted".to_string(),
                        FieldWrite::Set(completed.into()),
                    ),
                    (
                        "rating".to_string(),
                        FieldWrite::Set(rating_for(completed).into()),
                    ),
                ],
            )
            .await?;
        println!("Created user: {name}");
    }

    let mut dashboard = Task::new(
        "",
        "Design User Dashboard",
        "u-demo",
        now - Duration::days(10),
    )
    .with_description("Create a comprehensive dashboard for users to view their tasks and progress")
    .with_priority(Priority::High)
    .with_estimated_hours(8.0)
    .with_due_date(now - Duration::days(2))
    .with_assignee("u-demo")
    .with_status(TaskStatus::Done);
    // Already counted in the demo profile's history.
    dashboard.completed_at = Some(now - Duration::days(3));
    dashboard.updated_at = now - Duration::days(3);

    let reward_system = Task::new(
        "",
        "Implement Reward System",
        "u-demo",
        now - Duration::days(5),
    )
    .with_description("Build the reward point calculation system")
    .with_priority(Priority::High)
    .with_estimated_hours(12.0)
    .with_due_date(now + Duration::days(3))
    .with_assignee("u-demo")
    .with_status(TaskStatus::InProgress);

    let landing_page = Task::new("", "Create Landing Page", "u-john", now - Duration::days(4))
        .with_description("Design and develop the marketing landing page")
        .with_priority(Priority::Medium)
        .with_estimated_hours(6.0)
        .with_due_date(now + Duration::days(9));

    let user_testing = Task::new("", "User Testing", "u-john", now - Duration::days(3))
        .with_description("Conduct user testing sessions and gather feedback")
        .with_priority(Priority::Medium)
        .with_estimated_hours(4.0)
        .with_due_date(now + Duration::days(14))
        .with_assignee("u-sarah")
        .with_status(TaskStatus::Review);

    for task in [dashboard, reward_system, landing_page, user_testing] {
        let title = task.title.clone();
        service.store().insert(TASKS, encode_task(&task)?).await?;
        println!("Created task: {title}");
    }
    Ok(())
}

/// Import tasks from a CSV authored per the `tasksphere-ingest` header.
pub async fn seed_csv<S: DocumentStore>(
    service: &TaskService<S>,
    path: &Path,
    created_by: &str,
    now: DateTime<Utc>,
) -> Result<usize> {
    let seeds = parse_tasks_csv(path)?;
    let mut count = 0;
    for seed in seeds {
        let task = seed.into_task("", created_by, now);
        service.store().insert(TASKS, encode_task(&task)?).await?;
        count += 1;
    }
    Ok(count)
}
