//! tasksphere-ingest: CSV task import for seeding and bulk loads.

pub mod tasks_csv;
pub mod types;

pub use tasks_csv::parse_tasks_csv;
pub use types::TaskSeed;
