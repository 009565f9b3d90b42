// ABOUTME: MongoDB implementation of the document database seam
// ABOUTME: ObjectId round-tripping, bounded timeouts, and driver error mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cognix

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use serde_json::{Map, Value};
use tracing::debug;

use crate::constants::NETWORK_TIMEOUT;
use crate::document::{DatabaseConnector, DocumentDatabase, FindQuery, IndexSpec, SortOrder};
use crate::errors::{AppError, AppResult};
use crate::uri::redact_connection_string;

/// Map a driver error to the crate's structured taxonomy.
///
/// Auth failures must stay distinguishable from connectivity failures:
/// callers retry the latter and never the former.
fn map_driver_error(error: &mongodb::error::Error, context: &str) -> AppError {
    match &*error.kind {
        ErrorKind::Authentication { message, .. } => {
            AppError::auth(format!("{context}: {message}"))
        }
        // Unauthorized (13) / AuthenticationFailed (18) surface as command
        // errors once a connection is established
        ErrorKind::Command(cmd) if cmd.code == 13 || cmd.code == 18 => {
            AppError::auth(format!("{context}: {}", cmd.message))
        }
        _ => AppError::connection(format!("{context}: {error}")),
    }
}

const fn order_to_bson(order: SortOrder) -> i32 {
    match order {
        SortOrder::Asc => 1,
        SortOrder::Desc => -1,
    }
}

fn sort_document(keys: &[(String, SortOrder)]) -> Document {
    let mut sort = Document::new();
    for (field, order) in keys {
        sort.insert(field.clone(), order_to_bson(*order));
    }
    sort
}

/// Parse a string identifier into its native form, failing fast with a
/// validation error before any network call.
fn parse_object_id(id: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(id)
        .map_err(|_| AppError::validation(format!("Malformed document identifier: {id}")))
}

fn json_to_document(value: &Value) -> AppResult<Document> {
    bson::to_document(value)
        .map_err(|e| AppError::validation(format!("Document must be a JSON object: {e}")))
}

/// Convert a fetched document to the boundary JSON shape: the native `_id`
/// becomes a string `id` field.
fn document_to_json(mut document: Document) -> AppResult<Value> {
    let id = match document.remove("_id") {
        Some(Bson::ObjectId(oid)) => Some(oid.to_hex()),
        Some(other) => Some(other.to_string()),
        None => None,
    };
    let mut value = serde_json::to_value(&document)
        .map_err(|e| AppError::internal(format!("Failed to convert document to JSON: {e}")))?;
    if let (Some(id), Some(object)) = (id, value.as_object_mut()) {
        object.insert("id".to_owned(), Value::String(id));
    }
    Ok(value)
}

/// One tenant's (or the platform's) MongoDB database.
pub struct MongoDatabase {
    client: Client,
    name: String,
}

impl MongoDatabase {
    fn collection(&self, name: &str) -> Collection<Document> {
        self.client.database(&self.name).collection(name)
    }
}

#[async_trait]
impl DocumentDatabase for MongoDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ping(&self) -> AppResult<()> {
        let database = self.client.database(&self.name);
        tokio::time::timeout(NETWORK_TIMEOUT, async {
            database.run_command(doc! { "ping": 1 }).await
        })
        .await
        .map_err(|_| AppError::connection("Ping timed out"))?
        .map_err(|e| map_driver_error(&e, "Ping failed"))?;
        Ok(())
    }

    async fn server_info(&self) -> AppResult<Value> {
        let admin = self.client.database("admin");
        let info = tokio::time::timeout(NETWORK_TIMEOUT, async {
            admin.run_command(doc! { "buildInfo": 1 }).await
        })
        .await
        .map_err(|_| AppError::connection("buildInfo timed out"))?
        .map_err(|e| map_driver_error(&e, "buildInfo failed"))?;

        let mut summary = Map::new();
        if let Ok(version) = info.get_str("version") {
            summary.insert("version".to_owned(), Value::String(version.to_owned()));
        }
        if let Ok(max_size) = info.get_i32("maxBsonObjectSize") {
            summary.insert("maxBsonObjectSize".to_owned(), Value::from(max_size));
        }
        Ok(Value::Object(summary))
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> AppResult<()> {
        let mut keys = Document::new();
        for (field, order) in &index.keys {
            keys.insert(field.clone(), order_to_bson(*order));
        }
        let options = IndexOptions::builder().unique(index.unique).build();
        let model = IndexModel::builder().keys(keys).options(options).build();

        self.collection(collection)
            .create_index(model)
            .await
            .map_err(|e| map_driver_error(&e, "Index creation failed"))?;
        Ok(())
    }

    async fn insert_one(&self, collection: &str, document: Value) -> AppResult<String> {
        let doc = json_to_document(&document)?;
        let result = self
            .collection(collection)
            .insert_one(doc)
            .await
            .map_err(|e| map_driver_error(&e, "Insert failed"))?;

        let id = match result.inserted_id {
            Bson::ObjectId(oid) => oid.to_hex(),
            other => other.to_string(),
        };
        debug!(collection, id = %id, db = %self.name, "Inserted document");
        Ok(id)
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> AppResult<Option<Value>> {
        let oid = parse_object_id(id)?;
        let found = self
            .collection(collection)
            .find_one(doc! { "_id": oid })
            .await
            .map_err(|e| map_driver_error(&e, "Find failed"))?;
        found.map(document_to_json).transpose()
    }

    async fn update_by_id(&self, collection: &str, id: &str, fields: Value) -> AppResult<bool> {
        let oid = parse_object_id(id)?;
        let set = json_to_document(&fields)?;
        let result = self
            .collection(collection)
            .update_one(doc! { "_id": oid }, doc! { "$set": set })
            .await
            .map_err(|e| map_driver_error(&e, "Update failed"))?;
        Ok(result.matched_count > 0)
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> AppResult<bool> {
        let oid = parse_object_id(id)?;
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": oid })
            .await
            .map_err(|e| map_driver_error(&e, "Delete failed"))?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_many(&self, collection: &str, filter: Value) -> AppResult<u64> {
        let filter = json_to_document(&filter)?;
        let result = self
            .collection(collection)
            .delete_many(filter)
            .await
            .map_err(|e| map_driver_error(&e, "Delete failed"))?;
        Ok(result.deleted_count)
    }

    async fn find(&self, collection: &str, query: FindQuery) -> AppResult<Vec<Value>> {
        let filter = json_to_document(&query.filter)?;
        let collection = self.collection(collection);
        let mut find = collection.find(filter);
        if !query.sort.is_empty() {
            find = find.sort(sort_document(&query.sort));
        }
        if let Some(skip) = query.skip {
            find = find.skip(skip);
        }
        if let Some(limit) = query.limit {
            find = find.limit(limit);
        }

        let mut cursor = find
            .await
            .map_err(|e| map_driver_error(&e, "Find failed"))?;

        let mut results = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| map_driver_error(&e, "Cursor advance failed"))?
        {
            let document = cursor
                .deserialize_current()
                .map_err(|e| map_driver_error(&e, "Cursor decode failed"))?;
            results.push(document_to_json(document)?);
        }
        Ok(results)
    }

    async fn drop_collection(&self, collection: &str) -> AppResult<()> {
        self.collection(collection)
            .drop()
            .await
            .map_err(|e| map_driver_error(&e, "Drop failed"))?;
        Ok(())
    }
}

/// Connector opening [`MongoDatabase`] handles with bounded timeouts.
pub struct MongoConnector {
    timeout: Duration,
}

impl MongoConnector {
    /// Connector with the standard network timeout
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: NETWORK_TIMEOUT,
        }
    }

    /// Connector with a custom timeout bound
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for MongoConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseConnector for MongoConnector {
    async fn connect(
        &self,
        connection_string: &str,
        database_name: &str,
    ) -> AppResult<Arc<dyn DocumentDatabase>> {
        debug!(
            uri = %redact_connection_string(connection_string),
            database = database_name,
            "Opening database connection"
        );

        let mut options = tokio::time::timeout(self.timeout, async {
            ClientOptions::parse(connection_string).await
        })
        .await
        .map_err(|_| AppError::connection("Connection string resolution timed out"))?
        .map_err(|e| AppError::config(format!("Invalid connection string: {e}")))?;
        options.server_selection_timeout = Some(self.timeout);
        options.connect_timeout = Some(self.timeout);

        let client = Client::with_options(options)
            .map_err(|e| AppError::config(format!("Invalid client options: {e}")))?;

        let database = MongoDatabase {
            client,
            name: database_name.to_owned(),
        };
        database.ping().await?;
        Ok(Arc::new(database))
    }
}
