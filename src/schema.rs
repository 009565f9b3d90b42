// ABOUTME: Idempotent index setup for platform and tenant databases
// ABOUTME: Runs at most once per connection, retried after connectivity failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cognix

use tracing::{info, warn};

use crate::constants::{
    CHAT_SESSIONS_COLLECTION, DOCUMENTS_COLLECTION, DOCUMENT_CHUNKS_COLLECTION,
    MESSAGES_COLLECTION, USERS_COLLECTION,
};
use crate::document::{DocumentDatabase, IndexSpec, SortOrder};
use crate::errors::{AppError, AppResult};
use crate::registry::TenantConnection;

/// Index catalog for one tenant's collections.
fn tenant_indexes() -> Vec<(&'static str, IndexSpec)> {
    vec![
        (CHAT_SESSIONS_COLLECTION, IndexSpec::on("owner_id")),
        (CHAT_SESSIONS_COLLECTION, IndexSpec::on("created_at")),
        (
            CHAT_SESSIONS_COLLECTION,
            IndexSpec::compound(&[
                ("owner_id", SortOrder::Asc),
                ("created_at", SortOrder::Desc),
            ]),
        ),
        (MESSAGES_COLLECTION, IndexSpec::on("chat_id")),
        (MESSAGES_COLLECTION, IndexSpec::on("timestamp")),
        (
            MESSAGES_COLLECTION,
            IndexSpec::compound(&[("chat_id", SortOrder::Asc), ("timestamp", SortOrder::Asc)]),
        ),
        (DOCUMENTS_COLLECTION, IndexSpec::on("chat_id")),
        (DOCUMENTS_COLLECTION, IndexSpec::on("upload_date")),
        (DOCUMENTS_COLLECTION, IndexSpec::on("processing_status")),
        (DOCUMENT_CHUNKS_COLLECTION, IndexSpec::on("document_id")),
        (DOCUMENT_CHUNKS_COLLECTION, IndexSpec::on("chat_id")),
        (
            DOCUMENT_CHUNKS_COLLECTION,
            IndexSpec::compound(&[
                ("document_id", SortOrder::Asc),
                ("chunk_index", SortOrder::Asc),
            ]),
        ),
        (
            DOCUMENT_CHUNKS_COLLECTION,
            IndexSpec::compound(&[
                ("chat_id", SortOrder::Asc),
                ("chunk_index", SortOrder::Asc),
            ]),
        ),
    ]
}

/// Index catalog for the shared platform database.
fn platform_indexes() -> Vec<(&'static str, IndexSpec)> {
    vec![
        (USERS_COLLECTION, IndexSpec::on("email").unique()),
        (USERS_COLLECTION, IndexSpec::on("created_at")),
    ]
}

/// Apply an index catalog to a database.
///
/// Declaration failures (typically "already exists with different options")
/// are logged and skipped so one bad index never blocks the rest, but
/// connectivity failures abort: nothing later would succeed either.
async fn apply_indexes(
    database: &dyn DocumentDatabase,
    indexes: &[(&'static str, IndexSpec)],
) -> AppResult<()> {
    for (collection, index) in indexes {
        match database.create_index(collection, index).await {
            Ok(()) => {}
            Err(error @ AppError::Connection(_)) => return Err(error),
            Err(error) => {
                warn!(
                    database = database.name(),
                    collection, error = %error,
                    "Skipping index declaration"
                );
            }
        }
    }
    Ok(())
}

/// Ensure a tenant connection has its indexes declared.
///
/// Exactly one caller per connection performs the work; later callers see
/// the flag set and return immediately. A connectivity failure clears the
/// flag so the next request retries.
pub async fn ensure_tenant_schema(connection: &TenantConnection) -> AppResult<()> {
    if !connection.begin_schema_init() {
        return Ok(());
    }

    match apply_indexes(connection.database().as_ref(), &tenant_indexes()).await {
        Ok(()) => {
            info!(
                tenant_id = connection.tenant_id(),
                database = connection.database().name(),
                "Tenant database indexes declared"
            );
            Ok(())
        }
        Err(error) => {
            connection.reset_schema_init();
            Err(error)
        }
    }
}

/// Declare the platform database's indexes. Called once at startup.
pub async fn ensure_platform_schema(database: &dyn DocumentDatabase) -> AppResult<()> {
    apply_indexes(database, &platform_indexes()).await?;
    info!(database = database.name(), "Platform database indexes declared");
    Ok(())
}
