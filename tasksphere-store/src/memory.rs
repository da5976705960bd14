//! In-memory reference implementation of the `DocumentStore` contract.
//!
//! Backs the tests and the CLI. Collections are id-keyed JSON documents; a
//! single async mutex serializes writes the way the real store serializes
//! per-document updates. Every mutation re-runs live queries and fans the
//! fresh snapshots out through watch channels.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::store::{DocumentStore, FieldWrite, QuerySpec, StoreError, Subscription};

type Collection = BTreeMap<String, Value>;

struct Watcher {
    collection: String,
    spec: QuerySpec,
    tx: watch::Sender<Vec<Value>>,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Collection>,
    watchers: Vec<Watcher>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every collection as `{collection: {id: document}}`.
    pub async fn export(&self) -> Value {
        let inner = self.inner.lock().await;
        let mut out = Map::new();
        for (name, docs) in &inner.collections {
            let mut coll = Map::new();
            for (id, doc) in docs {
                coll.insert(id.clone(), doc.clone());
            }
            out.insert(name.clone(), Value::Object(coll));
        }
        Value::Object(out)
    }

    /// Replace all contents from an `export` snapshot.
    pub async fn import(&self, snapshot: Value) -> Result<(), StoreError> {
        let Value::Object(collections) = snapshot else {
            return Err(StoreError::Corrupt {
                collection: "<snapshot>".to_string(),
                reason: "expected a JSON object of collections".to_string(),
            });
        };

        let mut loaded: HashMap<String, Collection> = HashMap::new();
        for (name, docs) in collections {
            let Value::Object(docs) = docs else {
                return Err(StoreError::Corrupt {
                    collection: name,
                    reason: "expected a JSON object of documents".to_string(),
                });
            };
            loaded.insert(name, docs.into_iter().collect());
        }

        let mut inner = self.inner.lock().await;
        inner.collections = loaded;
        let names: Vec<String> = inner.collections.keys().cloned().collect();
        for name in names {
            notify(&mut inner, &name);
        }
        Ok(())
    }
}

fn run_query(collections: &HashMap<String, Collection>, collection: &str, spec: &QuerySpec) -> Vec<Value> {
    let docs = collections
        .get(collection)
        .map(|coll| {
            coll.values()
                .filter(|doc| spec.matches(doc))
                .cloned()
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    spec.arrange(docs)
}

fn notify(inner: &mut Inner, collection: &str) {
    let Inner {
        collections,
        watchers,
    } = inner;
    watchers.retain(|w| {
        if w.collection != collection {
            return !w.tx.is_closed();
        }
        let snapshot = run_query(collections, collection, &w.spec);
        w.tx.send(snapshot).is_ok()
    });
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .collections
            .get(collection)
            .and_then(|coll| coll.get(id))
            .cloned())
    }

    async fn set(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        notify(&mut inner, collection);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Vec<(String, FieldWrite)>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let doc = inner
            .collections
            .get_mut(collection)
            .and_then(|coll| coll.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        let Value::Object(map) = doc else {
            return Err(StoreError::Corrupt {
                collection: collection.to_string(),
                reason: format!("document `{id}` is not an object"),
            });
        };
        for (field, write) in fields {
            match write {
                FieldWrite::Set(value) => {
                    map.insert(field, value);
                }
                FieldWrite::Increment(delta) => {
                    let current = match map.get(&field) {
                        None | Some(Value::Null) => 0,
                        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
                        Some(other) => {
                            return Err(StoreError::Corrupt {
                                collection: collection.to_string(),
                                reason: format!("field `{field}` is not numeric: {other}"),
                            });
                        }
                    };
                    // Counters never go below zero.
                    map.insert(field, json!((current + delta).max(0)));
                }
            }
        }
        notify(&mut inner, collection);
        Ok(())
    }

    async fn insert(&self, collection: &str, doc: Value) -> Result<String, StoreError> {
        let Value::Object(mut map) = doc else {
            return Err(StoreError::Corrupt {
                collection: collection.to_string(),
                reason: "inserted document is not an object".to_string(),
            });
        };

        let id = Uuid::new_v4().to_string();
        map.insert("id".to_string(), json!(id));

        let mut inner = self.inner.lock().await;
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), Value::Object(map));
        notify(&mut inner, collection);
        Ok(id)
    }

    async fn query(&self, collection: &str, spec: &QuerySpec) -> Result<Vec<Value>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(run_query(&inner.collections, collection, spec))
    }

    async fn subscribe(
        &self,
        collection: &str,
        spec: QuerySpec,
    ) -> Result<Subscription, StoreError> {
        let mut inner = self.inner.lock().await;
        let initial = run_query(&inner.collections, collection, &spec);
        let (tx, rx) = watch::channel(initial);
        inner.watchers.push(Watcher {
            collection: collection.to_string(),
            spec,
            tx,
        });
        Ok(Subscription::new(rx))
    }

}
