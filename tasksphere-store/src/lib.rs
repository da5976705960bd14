//! tasksphere-store: document-store contract, in-memory reference store, and
//! the orchestration service wiring the core engine to persistence.

pub mod document;
pub mod identity;
pub mod memory;
pub mod service;
pub mod store;

pub use document::{decode_profile, decode_task, encode_profile, encode_task, TASKS, USERS};
pub use identity::{CurrentUser, FixedIdentity, Identity};
pub use memory::MemoryStore;
pub use service::{
    Award, DashboardWatch, NewTask, PendingAward, ReconcileReport, ServiceError, TaskService,
    TransitionReceipt,
};
pub use store::{
    DocumentStore, FieldWrite, QuerySpec, SortDirection, StoreError, Subscription,
};
