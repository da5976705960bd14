//! Document store contract.
//!
//! This is the boundary to the external persistence/query/notification
//! service: the engine consumes it, it does not implement storage semantics
//! beyond the in-memory reference (`memory`). Per-document writes are assumed
//! serialized by the store; `atomic_increment` is the mandatory primitive for
//! counter accumulation under concurrent writers.

use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Transient I/O failure; the caller may retry with backoff.
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// A stored document failed field validation at the boundary.
    #[error("corrupt document in `{collection}`: {reason}")]
    Corrupt { collection: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One field of a partial document write.
///
/// `Increment` is the store-side transform that keeps counters race-safe
/// under concurrent writers; all fields of one `update` call land atomically
/// in the document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldWrite {
    Set(Value),
    Increment(i64),
}

/// Equality filters, optional ordering, optional limit: the query surface the
/// engine needs from the store.
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<(String, SortDirection)>,
    pub limit: Option<usize>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn order_by_desc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some((field.into(), SortDirection::Descending));
        self
    }

    pub fn order_by_asc(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some((field.into(), SortDirection::Ascending));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Equality match against a document's top-level fields.
    pub fn matches(&self, doc: &Value) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }

    /// Apply ordering + limit to an already-filtered result set.
    pub fn arrange(&self, mut docs: Vec<Value>) -> Vec<Value> {
        if let Some((field, direction)) = &self.order_by {
            docs.sort_by(|a, b| {
                let ord = cmp_field(a.get(field), b.get(field));
                match direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }
        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }
        docs
    }
}

fn cmp_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

/// Live query handle.
///
/// Every change to the underlying collection delivers a fresh full result-set
/// snapshot (at-least-once; consumers recompute from each snapshot rather
/// than patching incrementally). Dropping the handle unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    rx: watch::Receiver<Vec<Value>>,
}

impl Subscription {
    pub fn new(rx: watch::Receiver<Vec<Value>>) -> Self {
        Self { rx }
    }

    /// The latest delivered result set.
    pub fn snapshot(&self) -> Vec<Value> {
        self.rx.borrow().clone()
    }

    /// Wait for the next snapshot. Returns false once the store side is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    pub fn unsubscribe(self) {}
}

/// The consumed persistence contract.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document, `None` when absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// Full write of one document under a caller-chosen id.
    async fn set(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError>;

    /// Partial write: apply the named field writes as one atomic document
    /// update.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Vec<(String, FieldWrite)>,
    ) -> Result<(), StoreError>;

    /// Insert with a store-assigned id; the id is also injected into the
    /// stored document's `id` field and returned.
    async fn insert(&self, collection: &str, doc: Value) -> Result<String, StoreError>;

    async fn query(&self, collection: &str, spec: &QuerySpec) -> Result<Vec<Value>, StoreError>;

    /// Live snapshots of a query's result set.
    async fn subscribe(&self, collection: &str, spec: QuerySpec)
        -> Result<Subscription, StoreError>;

    /// Numeric field increment, serialized store-side. Counters never go
    /// below zero.
    async fn atomic_increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<(), StoreError> {
        self.update(
            collection,
            id,
            vec![(field.to_string(), FieldWrite::Increment(delta))],
        )
        .await
    }
}
