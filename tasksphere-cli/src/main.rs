use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod seed;
mod state;
mod time;

use tasksphere_core::{points_for, Priority};
use tasksphere_store::{Award, FixedIdentity, Identity, NewTask, TaskService};

#[derive(Parser, Debug)]
#[command(name = "tasksphere", version, about = "TaskSphere task & reward CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// One-time setup: write ~/.tasksphere/config.toml
    Init,

    /// Load the built-in demo data, or import tasks from a CSV
    Seed {
        /// CSV with header title,description,priority,status,estimated_hours,due_date,assigned_to
        #[arg(long)]
        csv: Option<PathBuf>,

        #[arg(long = "as")]
        acting: Option<String>,
    },

    /// Register a user profile
    Signup {
        uid: String,
        email: String,
        name: String,
    },

    /// Create a task
    Create {
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        /// low | medium | high
        #[arg(long, default_value = "medium")]
        priority: String,

        /// Estimated effort in hours
        #[arg(long)]
        hours: Option<f64>,

        /// Local due date "YYYY-MM-DD HH:MM" in the configured timezone
        #[arg(long)]
        due: Option<String>,

        #[arg(long)]
        assign: Option<String>,

        #[arg(long)]
        project: Option<String>,

        /// Start the task in in-progress (pre-assigned tasks only)
        #[arg(long)]
        start_in_progress: bool,

        #[arg(long = "as")]
        acting: Option<String>,
    },

    /// List tasks, optionally scoped to one assignee
    List {
        #[arg(long)]
        user: Option<String>,
    },

    /// Show one task in full
    Show { task_id: String },

    /// Reassign a task
    Assign { task_id: String, uid: String },

    /// Move a task to a new status (todo | in-progress | review | done)
    Transition {
        task_id: String,
        status: String,

        #[arg(long = "as")]
        acting: Option<String>,
    },

    /// Mark a task done (assignee only)
    Complete {
        task_id: String,

        #[arg(long = "as")]
        acting: Option<String>,
    },

    /// Summary stats + recent activity for a user
    Dashboard {
        #[arg(long)]
        user: Option<String>,
    },

    /// Show a user profile
    Profile { uid: String },

    /// Awards owed after a failed profile write
    Pending,

    /// Apply queued awards
    Reconcile,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let cfg = config::load_config()?;
    let state_file = PathBuf::from(&cfg.store.state_file);
    let pending_file = state::pending_path()?;

    let store = state::load_store(&state_file).await?;
    let service = TaskService::new(store);
    service
        .restore_pending(state::load_pending(&pending_file)?)
        .await;

    let now = Utc::now();

    match cli.command {
        Command::Init => config::init_config()?,

        Command::Seed { csv, acting } => match csv {
            Some(path) => {
                let creator = resolve_actor(acting, &cfg)?;
                let count = seed::seed_csv(&service, &path, &creator, now)
                    .await
                    .with_context(|| format!("importing {}", path.display()))?;
                println!("Imported {count} tasks from {}", path.display());
            }
            None => seed::seed_demo(&service, now).await?,
        },

        Command::Signup { uid, email, name } => {
            let profile = service.signup(&uid, &email, &name, now).await?;
            println!("Created profile {} <{}>", profile.display_name, profile.email);
        }

        Command::Create {
            title,
            description,
            priority,
            hours,
            due,
            assign,
            project,
            start_in_progress,
            acting,
        } => {
            let Some(priority) = Priority::parse(&priority) else {
                bail!("unknown priority `{priority}` (expected low|medium|high)");
            };
            let creator = resolve_actor(acting, &cfg)?;

            let mut new_task = NewTask::new(title)
                .with_description(description)
                .with_priority(priority);
            if let Some(h) = hours {
                new_task = new_task.with_estimated_hours(h);
            }
            if let Some(due) = due {
                new_task =
                    new_task.with_due_date(time::parse_local_due_to_utc(&due, &cfg.display.timezone)?);
            }
            if let Some(uid) = assign {
                new_task = new_task.with_assignee(uid);
            }
            if let Some(project_id) = project {
                new_task = new_task.with_project(project_id);
            }
            if start_in_progress {
                new_task = new_task.starting_in_progress();
            }

            let task = service.create_task(new_task, &creator, now).await?;
            println!("Created task {} ({})", task.id, task.status);
        }

        Command::List { user } => {
            let tasks = service.tasks(user.as_deref()).await?;
            if tasks.is_empty() {
                println!("No tasks.");
            }
            for t in tasks {
                let overdue = if t.is_overdue(now) { " (overdue)" } else { "" };
                let assignee = t.assigned_to.as_deref().unwrap_or("-");
                println!(
                    "{}  [{:11}] {:6} {:3}pt  {} -> {}{}",
                    t.id,
                    t.status.to_string(),
                    t.priority.to_string(),
                    points_for(&t),
                    t.title,
                    assignee,
                    overdue,
                );
            }
        }

        Command::Show { task_id } => {
            let t = service.task(&task_id).await?;
            println!("{}: {}", t.id, t.title);
            if !t.description.is_empty() {
                println!("  {}", t.description);
            }
            println!("  status: {}  priority: {}", t.status, t.priority);
            println!("  reward: {} points", points_for(&t));
            if let Some(h) = t.estimated_hours {
                println!("  estimate: {h}h");
            }
            if let Some(due) = t.due_date {
                let overdue = if t.is_overdue(now) { " (overdue)" } else { "" };
                println!(
                    "  due: {}{}",
                    time::format_in_tz(due, &cfg.display.timezone),
                    overdue
                );
            }
            println!("  created by {}", t.created_by);
            println!("  assigned to {}", t.assigned_to.as_deref().unwrap_or("-"));
            if let Some(done) = t.completed_at {
                println!(
                    "  completed at {}",
                    time::format_in_tz(done, &cfg.display.timezone)
                );
            }
        }

        Command::Assign { task_id, uid } => {
            let task = service.assign_task(&task_id, &uid, now).await?;
            println!("Assigned {} to {}", task.id, uid);
        }

        Command::Transition {
            task_id,
            status,
            acting,
        } => {
            let actor = resolve_actor(acting, &cfg)?;
            let receipt = service.transition_task(&task_id, &status, &actor, now).await?;
            report_receipt(&receipt.award, &receipt.task.status.to_string());
        }

        Command::Complete { task_id, acting } => {
            let actor = resolve_actor(acting, &cfg)?;
            let receipt = service.transition_task(&task_id, "done", &actor, now).await?;
            report_receipt(&receipt.award, &receipt.task.status.to_string());
        }

        Command::Dashboard { user } => {
            let uid = resolve_actor(user, &cfg)?;
            let stats = service.dashboard(&uid).await?;
            println!("Dashboard for {uid}");
            println!("  total tasks:  {}", stats.total_tasks);
            println!("  completed:    {}", stats.completed_tasks);
            println!("  in progress:  {}", stats.in_progress_tasks);
            println!("  recent:");
            for t in &stats.recent_tasks {
                println!("    {}  [{}] {}", t.id, t.status, t.title);
            }
        }

        Command::Profile { uid } => {
            let p = service.profile(&uid).await?;
            println!("{} <{}>", p.display_name, p.email);
            println!("  points:    {}", p.reward_points);
            println!("  rating:    {}/5", p.rating);
            println!("  completed: {} tasks, {} projects", p.tasks_completed, p.projects_completed);
        }

        Command::Pending => {
            let pending = service.pending_awards().await;
            if pending.is_empty() {
                println!("No awards pending.");
            }
            for award in pending {
                println!(
                    "{}: {} points for {} (run `tasksphere reconcile`)",
                    award.task_id, award.points, award.uid
                );
            }
        }

        Command::Reconcile => {
            let report = service.reconcile().await;
            for award in &report.applied {
                println!("Applied {} points to {}", award.points, award.uid);
            }
            if !report.still_pending.is_empty() {
                println!("{} awards still failing; retry later.", report.still_pending.len());
            }
            if report.applied.is_empty() && report.still_pending.is_empty() {
                println!("Nothing to reconcile.");
            }
        }
    }

    state::save_store(service.store(), &state_file).await?;
    state::save_pending(&service.pending_awards().await, &pending_file)?;
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Acting user: `--as` wins, then the configured default identity.
fn resolve_actor(explicit: Option<String>, cfg: &config::Config) -> Result<String> {
    let identity = match explicit.or_else(|| cfg.identity.default_user.clone()) {
        Some(uid) => {
            let email = format!("{uid}@tasksphere.local");
            FixedIdentity::signed_in(uid, email)
        }
        None => FixedIdentity::signed_out(),
    };
    match identity.current_user() {
        Some(user) => Ok(user.uid),
        None => bail!("no acting user: pass --as <uid> or set identity.default_user in config.toml"),
    }
}

fn report_receipt(award: &Award, status: &str) {
    match award {
        Award::Granted { points } => println!("Task completed! Earned {points} points."),
        Award::Pending { points } => println!(
            "Task is done, but {points} points could not be applied; run `tasksphere reconcile`."
        ),
        Award::AlreadyCounted => println!("Task is done; this completion was already counted."),
        Award::None => println!("Task status updated to {status}."),
    }
}
