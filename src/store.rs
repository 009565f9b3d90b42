// ABOUTME: Typed CRUD layer over any document database handle
// ABOUTME: Generic over the record type; ids cross the boundary as strings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cognix

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::document::{DocumentDatabase, FindQuery};
use crate::errors::{AppError, AppResult};

/// Typed collection view over a database handle.
///
/// Works identically against the platform database and any tenant database;
/// the caller picks the handle via [`crate::router::RequestRouter::resolve`].
/// Records carry an optional string `id` field that the store assigns on
/// create and round-trips on reads.
pub struct DocumentStore<T> {
    database: Arc<dyn DocumentDatabase>,
    collection: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> DocumentStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// Store over one collection of the given database
    #[must_use]
    pub fn new(database: Arc<dyn DocumentDatabase>, collection: impl Into<String>) -> Self {
        Self {
            database,
            collection: collection.into(),
            _record: PhantomData,
        }
    }

    /// Collection this store reads and writes
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn to_stored_value(record: &T) -> AppResult<Value> {
        let mut value = serde_json::to_value(record)
            .map_err(|e| AppError::validation(format!("Record is not serializable: {e}")))?;
        // The id is owned by the database; never persist it as a field.
        if let Some(object) = value.as_object_mut() {
            object.remove("id");
        }
        Ok(value)
    }

    fn from_stored_value(value: Value) -> AppResult<T> {
        serde_json::from_value(value)
            .map_err(|e| AppError::internal(format!("Stored record does not match schema: {e}")))
    }

    /// Insert a record and return its assigned identifier
    pub async fn create(&self, record: &T) -> AppResult<String> {
        let value = Self::to_stored_value(record)?;
        let id = self.database.insert_one(&self.collection, value).await?;
        debug!(collection = %self.collection, id = %id, "Created record");
        Ok(id)
    }

    /// Fetch a record by identifier
    pub async fn get(&self, id: &str) -> AppResult<Option<T>> {
        let found = self.database.find_by_id(&self.collection, id).await?;
        found.map(Self::from_stored_value).transpose()
    }

    /// Set the given fields on a record. Returns whether it existed.
    pub async fn update(&self, id: &str, fields: Value) -> AppResult<bool> {
        self.database.update_by_id(&self.collection, id, fields).await
    }

    /// Delete a record by identifier. Returns whether it existed.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        self.database.delete_by_id(&self.collection, id).await
    }

    /// Fetch every record matching the query, in query sort order
    pub async fn find(&self, query: FindQuery) -> AppResult<Vec<T>> {
        let values = self.database.find(&self.collection, query).await?;
        values.into_iter().map(Self::from_stored_value).collect()
    }

    /// Delete every record matching the filter. Returns the removed count.
    pub async fn delete_many(&self, filter: Value) -> AppResult<u64> {
        self.database.delete_many(&self.collection, filter).await
    }
}

impl<T> std::fmt::Debug for DocumentStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("database", &self.database.name())
            .field("collection", &self.collection)
            .finish()
    }
}
