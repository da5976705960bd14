//! Error taxonomy shared across the workspace.
//!
//! Pure rejections (`InvalidTransition`, `NotAuthorized`) are produced before
//! any write and must never be retried. The I/O-shaped variants
//! (`ProfileNotFound`, `StoreUnavailable`) are the caller's to retry; retrying
//! a completion for the same task id is safe (see `accumulator`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The requested target is not one of the four task states.
    #[error("invalid task status `{requested}` (expected todo|in-progress|review|done)")]
    InvalidTransition { requested: String },

    /// Only the current assignee may complete a task.
    #[error("user `{actor}` is not the assignee and cannot complete this task")]
    NotAuthorized { actor: String },

    /// The accumulator target profile does not exist.
    #[error("no profile found for user `{uid}`")]
    ProfileNotFound { uid: String },

    /// Transient failure from the external document store.
    #[error("document store unavailable: {reason}")]
    StoreUnavailable { reason: String },
}
