// ABOUTME: Backend-agnostic document database traits for the routing core
// ABOUTME: Everything above the driver talks to these, never to a concrete client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cognix

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppResult;

/// Sort direction for index keys and find queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

/// A secondary index over one or more fields of a collection
#[derive(Debug, Clone)]
pub struct IndexSpec {
    /// Ordered (field, direction) pairs
    pub keys: Vec<(String, SortOrder)>,
    /// Whether the index enforces uniqueness
    pub unique: bool,
}

impl IndexSpec {
    /// Single-field ascending index
    #[must_use]
    pub fn on(field: &str) -> Self {
        Self {
            keys: vec![(field.to_owned(), SortOrder::Asc)],
            unique: false,
        }
    }

    /// Compound index over the given (field, direction) pairs
    #[must_use]
    pub fn compound(keys: &[(&str, SortOrder)]) -> Self {
        Self {
            keys: keys
                .iter()
                .map(|(field, order)| ((*field).to_owned(), *order))
                .collect(),
            unique: false,
        }
    }

    /// Mark the index unique
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// A find query: equality filter, ordered sort, then skip, then limit.
#[derive(Debug, Clone)]
pub struct FindQuery {
    /// Field-equality filter; an empty object matches everything
    pub filter: Value,
    /// Sort keys applied in order
    pub sort: Vec<(String, SortOrder)>,
    /// Documents to skip after sorting
    pub skip: Option<u64>,
    /// Maximum documents to return after skip
    pub limit: Option<i64>,
}

impl Default for FindQuery {
    fn default() -> Self {
        Self {
            filter: Value::Object(serde_json::Map::new()),
            sort: Vec::new(),
            skip: None,
            limit: None,
        }
    }
}

impl FindQuery {
    /// Query matching the given equality filter
    #[must_use]
    pub fn filter(filter: Value) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Add a sort key
    #[must_use]
    pub fn sort_by(mut self, field: &str, order: SortOrder) -> Self {
        self.sort.push((field.to_owned(), order));
        self
    }

    /// Set the skip count
    #[must_use]
    pub const fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Set the result limit
    #[must_use]
    pub const fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A live handle to one logical document database.
///
/// Documents cross this boundary as JSON values with a string `id` field;
/// the implementation owns the mapping to its native identifier type and
/// must reject malformed identifiers with a validation error before any
/// network call.
///
/// Handles are safe for concurrent multiplexed use and are only released by
/// dropping the last reference — no component closes a handle another might
/// still be using.
#[async_trait]
pub trait DocumentDatabase: Send + Sync {
    /// Logical database name this handle is bound to
    fn name(&self) -> &str;

    /// Lightweight liveness probe
    async fn ping(&self) -> AppResult<()>;

    /// Server build information (version, size limits) as a JSON object
    async fn server_info(&self) -> AppResult<Value>;

    /// Create a secondary index; already-existing indexes are not an error
    async fn create_index(&self, collection: &str, index: &IndexSpec) -> AppResult<()>;

    /// Insert a document, returning its assigned identifier as a string
    async fn insert_one(&self, collection: &str, document: Value) -> AppResult<String>;

    /// Fetch one document by identifier
    async fn find_by_id(&self, collection: &str, id: &str) -> AppResult<Option<Value>>;

    /// Set the given fields on one document; returns whether it existed
    async fn update_by_id(&self, collection: &str, id: &str, fields: Value) -> AppResult<bool>;

    /// Delete one document by identifier; returns whether it existed
    async fn delete_by_id(&self, collection: &str, id: &str) -> AppResult<bool>;

    /// Delete every document matching the filter, returning the count
    async fn delete_many(&self, collection: &str, filter: Value) -> AppResult<u64>;

    /// Run a find query
    async fn find(&self, collection: &str, query: FindQuery) -> AppResult<Vec<Value>>;

    /// Drop an entire collection; absent collections are not an error
    async fn drop_collection(&self, collection: &str) -> AppResult<()>;
}

/// Opens live [`DocumentDatabase`] handles from connection strings.
///
/// The seam between the routing core and the driver: the registry, the
/// validator, and the router all connect through this trait, which lets
/// tests substitute an in-memory backend and count connection attempts.
#[async_trait]
pub trait DatabaseConnector: Send + Sync + 'static {
    /// Open a connection to `database_name` at `connection_string` and
    /// verify liveness with a ping, all within the network timeout.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the target is unreachable or the
    /// timeout elapses, and an auth error if the target is reachable but
    /// rejects the credentials.
    async fn connect(
        &self,
        connection_string: &str,
        database_name: &str,
    ) -> AppResult<Arc<dyn DocumentDatabase>>;
}
