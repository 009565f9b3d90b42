// ABOUTME: Safe probing of untrusted tenant connection strings
// ABOUTME: Format check, bounded liveness probe, and a CRUD smoke test
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cognix

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::constants::SMOKE_TEST_COLLECTION;
use crate::document::{DatabaseConnector, DocumentDatabase};
use crate::errors::AppResult;
use crate::uri::{extract_database_name, is_supported_scheme, redact_connection_string};

/// Outcome of validating a connection string. Produced fresh per call and
/// never cached; a string that validated a minute ago may be dead now.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the connection string is usable
    pub valid: bool,
    /// Failure cause, when `valid` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Logical database name the string resolves to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,
    /// Server build summary (version, max document size)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_info: Option<Value>,
}

impl ValidationResult {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
            database_name: None,
            server_info: None,
        }
    }
}

/// Outcome of the CRUD smoke test. `operations_tested` lists the operation
/// names that succeeded, in execution order, even when a later one failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmokeTestResult {
    /// Whether the whole sequence completed
    pub success: bool,
    /// Operation names that succeeded, in order
    pub operations_tested: Vec<String>,
    /// First failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Probes untrusted connection strings on short-lived connections.
///
/// Every connection the validator opens dies with the call; nothing here
/// ever enters the [`crate::registry::ConnectionRegistry`] cache.
pub struct ConnectionValidator {
    connector: Arc<dyn DatabaseConnector>,
}

impl ConnectionValidator {
    /// Validator backed by the given connector
    #[must_use]
    pub fn new(connector: Arc<dyn DatabaseConnector>) -> Self {
        Self { connector }
    }

    /// Check format, then liveness, then fetch server build info.
    ///
    /// Strings with an unrecognized scheme are rejected before any network
    /// activity, so this cannot be used to probe arbitrary endpoints.
    pub async fn validate(&self, connection_string: &str, tenant_id: &str) -> ValidationResult {
        if !is_supported_scheme(connection_string) {
            return ValidationResult::failure(
                "Connection string must start with mongodb:// or mongodb+srv://",
            );
        }

        let database_name = extract_database_name(connection_string, tenant_id);
        let database = match self.connector.connect(connection_string, &database_name).await {
            Ok(database) => database,
            Err(error) => {
                warn!(
                    uri = %redact_connection_string(connection_string),
                    error = %error,
                    "Connection string failed validation"
                );
                return ValidationResult::failure(error.to_string());
            }
        };

        let server_info = match database.server_info().await {
            Ok(info) => Some(info),
            Err(error) => {
                // A server that answers ping but not buildInfo is still
                // usable; report it valid without the summary.
                warn!(error = %error, "Could not fetch server build info");
                None
            }
        };

        info!(
            uri = %redact_connection_string(connection_string),
            database = %database_name,
            "Connection string validated"
        );
        ValidationResult {
            valid: true,
            error: None,
            database_name: Some(database_name),
            server_info,
        }
    }

    /// Exercise insert, find, update, and delete on a scratch collection.
    ///
    /// The scratch collection is dropped whatever happens, so a mid-sequence
    /// failure leaves no partial write behind.
    pub async fn smoke_test(&self, tenant_id: &str, connection_string: &str) -> SmokeTestResult {
        if !is_supported_scheme(connection_string) {
            return SmokeTestResult {
                success: false,
                operations_tested: Vec::new(),
                error: Some(
                    "Connection string must start with mongodb:// or mongodb+srv://".to_owned(),
                ),
            };
        }

        let database_name = extract_database_name(connection_string, tenant_id);
        let database = match self.connector.connect(connection_string, &database_name).await {
            Ok(database) => database,
            Err(error) => {
                return SmokeTestResult {
                    success: false,
                    operations_tested: Vec::new(),
                    error: Some(error.to_string()),
                }
            }
        };

        let mut operations = Vec::new();
        let outcome = Self::run_crud_sequence(database.as_ref(), &mut operations).await;

        if let Err(error) = database.drop_collection(SMOKE_TEST_COLLECTION).await {
            warn!(error = %error, "Could not drop smoke test collection");
        }

        match outcome {
            Ok(()) => {
                info!(tenant_id, "Database operations test successful");
                SmokeTestResult {
                    success: true,
                    operations_tested: operations,
                    error: None,
                }
            }
            Err(error) => {
                warn!(tenant_id, error = %error, "Database operations test failed");
                SmokeTestResult {
                    success: false,
                    operations_tested: operations,
                    error: Some(error.to_string()),
                }
            }
        }
    }

    async fn run_crud_sequence(
        database: &dyn DocumentDatabase,
        operations: &mut Vec<String>,
    ) -> AppResult<()> {
        let probe = json!({
            "probe": true,
            "created_at": chrono::Utc::now().to_rfc3339(),
        });
        let id = database.insert_one(SMOKE_TEST_COLLECTION, probe).await?;
        operations.push("insert".to_owned());

        database.find_by_id(SMOKE_TEST_COLLECTION, &id).await?;
        operations.push("find".to_owned());

        database
            .update_by_id(SMOKE_TEST_COLLECTION, &id, json!({ "probe": false }))
            .await?;
        operations.push("update".to_owned());

        database.delete_by_id(SMOKE_TEST_COLLECTION, &id).await?;
        operations.push("delete".to_owned());

        Ok(())
    }
}
