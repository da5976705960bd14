//! tasksphere-core: task lifecycle and reward accounting engine.
//!
//! Pure domain logic: no I/O, no async, no clock reads. Callers inject `now`
//! and own persistence; the store-facing layers live in `tasksphere-store`.

pub mod accumulator;
pub mod dashboard;
pub mod error;
pub mod lifecycle;
pub mod profile;
pub mod reward;
pub mod task;

pub use accumulator::{apply_completion, rating_for, CompletionLedger};
pub use dashboard::{summarize, DashboardStats, RECENT_TASKS_LIMIT};
pub use error::Error;
pub use lifecycle::{assign, transition, TaskCompleted, TransitionOutcome};
pub use profile::{is_valid_email, UserProfile};
pub use reward::{flat_award, multiplier, points_for};
pub use task::{Priority, Task, TaskStatus};
