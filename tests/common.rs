// ABOUTME: Shared test utilities for integration tests
// ABOUTME: In-memory database and connector doubles with call counters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cognix
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]
#![allow(dead_code, clippy::must_use_candidate, clippy::missing_errors_doc)]
//! Shared test utilities for `cognix_server`
//!
//! Provides an in-memory [`DocumentDatabase`] and [`DatabaseConnector`] so
//! integration tests can exercise the registry, router, and settings flows
//! without a live server.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cognix_server::document::{
    DatabaseConnector, DocumentDatabase, FindQuery, IndexSpec, SortOrder,
};
use cognix_server::errors::{AppError, AppResult};
use serde_json::Value;

/// Best-effort logging setup; later calls are a no-op.
pub fn init_test_logging() {
    let _ = cognix_server::logging::init_logging("debug");
}

/// In-memory stand-in for one logical database.
pub struct MemoryDatabase {
    name: String,
    collections: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    indexes: Mutex<Vec<(String, IndexSpec)>>,
    /// Total `create_index` calls received
    pub index_calls: AtomicUsize,
    /// When set, every `create_index` call fails with this error
    pub index_error: Mutex<Option<AppError>>,
    /// When set, `update_by_id` fails with a connection error
    pub fail_updates: AtomicBool,
}

impl MemoryDatabase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collections: Mutex::new(HashMap::new()),
            indexes: Mutex::new(Vec::new()),
            index_calls: AtomicUsize::new(0),
            index_error: Mutex::new(None),
            fail_updates: AtomicBool::new(false),
        }
    }

    pub fn declared_indexes(&self) -> Vec<(String, IndexSpec)> {
        self.indexes.lock().unwrap().clone()
    }

    pub fn collection_len(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    pub fn has_collection(&self, collection: &str) -> bool {
        self.collections.lock().unwrap().contains_key(collection)
    }

    fn with_id(id: &str, mut value: Value) -> Value {
        if let Some(object) = value.as_object_mut() {
            object.insert("id".to_owned(), Value::String(id.to_owned()));
        }
        value
    }

    fn matches(filter: &Value, id: &str, stored: &Value) -> bool {
        let Some(filter) = filter.as_object() else {
            return true;
        };
        filter.iter().all(|(key, expected)| {
            if key == "id" || key == "_id" {
                return expected.as_str() == Some(id);
            }
            stored.get(key) == Some(expected)
        })
    }

    fn compare_by(sort: &[(String, SortOrder)], a: &Value, b: &Value) -> std::cmp::Ordering {
        use std::cmp::Ordering as O;
        for (field, order) in sort {
            let (va, vb) = (a.get(field), b.get(field));
            let cmp = match (va, vb) {
                (Some(Value::Number(x)), Some(Value::Number(y))) => x
                    .as_f64()
                    .partial_cmp(&y.as_f64())
                    .unwrap_or(O::Equal),
                (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
                (Some(_), None) => O::Greater,
                (None, Some(_)) => O::Less,
                _ => O::Equal,
            };
            let cmp = match order {
                SortOrder::Asc => cmp,
                SortOrder::Desc => cmp.reverse(),
            };
            if cmp != O::Equal {
                return cmp;
            }
        }
        O::Equal
    }
}

#[async_trait]
impl DocumentDatabase for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn server_info(&self) -> AppResult<Value> {
        Ok(serde_json::json!({ "version": "7.0.0-memory", "maxBsonObjectSize": 16_777_216 }))
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> AppResult<()> {
        self.index_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.index_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.indexes
            .lock()
            .unwrap()
            .push((collection.to_owned(), index.clone()));
        Ok(())
    }

    async fn insert_one(&self, collection: &str, document: Value) -> AppResult<String> {
        if !document.is_object() {
            return Err(AppError::validation("Document must be a JSON object"));
        }
        let id = uuid::Uuid::new_v4().simple().to_string();
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_owned())
            .or_default()
            .insert(id.clone(), document);
        Ok(id)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|stored| Self::with_id(id, stored.clone())))
    }

    async fn update_by_id(&self, collection: &str, id: &str, fields: Value) -> AppResult<bool> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::connection("Simulated write failure"));
        }
        let Some(fields) = fields.as_object().cloned() else {
            return Err(AppError::validation("Update fields must be a JSON object"));
        };
        let mut collections = self.collections.lock().unwrap();
        let Some(stored) = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
        else {
            return Ok(false);
        };
        if let Some(object) = stored.as_object_mut() {
            for (key, value) in fields {
                object.insert(key, value);
            }
        }
        Ok(true)
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> AppResult<bool> {
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get_mut(collection)
            .is_some_and(|docs| docs.remove(id).is_some()))
    }

    async fn delete_many(&self, collection: &str, filter: Value) -> AppResult<u64> {
        let mut collections = self.collections.lock().unwrap();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let doomed: Vec<String> = docs
            .iter()
            .filter(|(id, stored)| Self::matches(&filter, id, stored))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &doomed {
            docs.remove(id);
        }
        Ok(doomed.len() as u64)
    }

    async fn find(&self, collection: &str, query: FindQuery) -> AppResult<Vec<Value>> {
        let collections = self.collections.lock().unwrap();
        let mut matched: Vec<Value> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(id, stored)| Self::matches(&query.filter, id, stored))
                    .map(|(id, stored)| Self::with_id(id, stored.clone()))
                    .collect()
            })
            .unwrap_or_default();
        if !query.sort.is_empty() {
            matched.sort_by(|a, b| Self::compare_by(&query.sort, a, b));
        }
        let skip = usize::try_from(query.skip.unwrap_or(0)).unwrap();
        let mut matched: Vec<Value> = matched.into_iter().skip(skip).collect();
        if let Some(limit) = query.limit {
            matched.truncate(usize::try_from(limit).unwrap());
        }
        Ok(matched)
    }

    async fn drop_collection(&self, collection: &str) -> AppResult<()> {
        self.collections.lock().unwrap().remove(collection);
        Ok(())
    }
}

/// Connector double. Databases are keyed by name, so repeated connects to
/// the same logical database share state like a real server would.
pub struct MemoryConnector {
    databases: Mutex<HashMap<String, Arc<MemoryDatabase>>>,
    /// Total `connect` calls received
    pub connect_calls: AtomicUsize,
    /// Artificial latency per connect, to widen concurrency windows
    pub connect_delay: Mutex<Duration>,
    /// When set, every connect fails with a connection error
    pub fail_connects: AtomicBool,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self {
            databases: Mutex::new(HashMap::new()),
            connect_calls: AtomicUsize::new(0),
            connect_delay: Mutex::new(Duration::ZERO),
            fail_connects: AtomicBool::new(false),
        }
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.connect_delay.lock().unwrap() = delay;
    }

    pub fn database(&self, name: &str) -> Option<Arc<MemoryDatabase>> {
        self.databases.lock().unwrap().get(name).cloned()
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseConnector for MemoryConnector {
    async fn connect(
        &self,
        _connection_string: &str,
        database_name: &str,
    ) -> AppResult<Arc<dyn DocumentDatabase>> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.connect_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_connects.load(Ordering::SeqCst) {
            return Err(AppError::connection("Simulated connection failure"));
        }
        let database = Arc::clone(
            self.databases
                .lock()
                .unwrap()
                .entry(database_name.to_owned())
                .or_insert_with(|| Arc::new(MemoryDatabase::new(database_name))),
        );
        Ok(database)
    }
}
