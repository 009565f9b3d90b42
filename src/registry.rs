// ABOUTME: Cached tenant connection registry with single-flight connection setup
// ABOUTME: Concurrent callers for one tenant share a single connection attempt
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cognix

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use tracing::{debug, info, warn};

use crate::document::{DatabaseConnector, DocumentDatabase};
use crate::errors::{AppError, AppResult};
use crate::uri::{extract_database_name, redact_connection_string};

/// A live connection to one tenant's database.
///
/// Handles are shared via `Arc`; the underlying client is released when the
/// registry entry and every outstanding caller have dropped theirs.
pub struct TenantConnection {
    tenant_id: String,
    database: Arc<dyn DocumentDatabase>,
    connected_at: DateTime<Utc>,
    schema_initialized: AtomicBool,
}

impl TenantConnection {
    fn new(tenant_id: String, database: Arc<dyn DocumentDatabase>) -> Self {
        Self {
            tenant_id,
            database,
            connected_at: Utc::now(),
            schema_initialized: AtomicBool::new(false),
        }
    }

    /// Tenant this connection belongs to
    #[must_use]
    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// The tenant's database handle
    #[must_use]
    pub fn database(&self) -> &Arc<dyn DocumentDatabase> {
        &self.database
    }

    /// When the connection was established
    #[must_use]
    pub const fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Whether schema setup has already completed on this connection
    #[must_use]
    pub fn schema_initialized(&self) -> bool {
        self.schema_initialized.load(Ordering::Acquire)
    }

    /// Claim the schema setup slot. Returns `true` for exactly one caller
    /// per connection; everyone else skips the work.
    pub(crate) fn begin_schema_init(&self) -> bool {
        self.schema_initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the slot after a failed setup so a later request retries.
    pub(crate) fn reset_schema_init(&self) {
        self.schema_initialized.store(false, Ordering::Release);
    }
}

impl std::fmt::Debug for TenantConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantConnection")
            .field("tenant_id", &self.tenant_id)
            .field("database", &self.database.name())
            .field("connected_at", &self.connected_at)
            .field("schema_initialized", &self.schema_initialized())
            .finish()
    }
}

type ConnectFuture = Shared<BoxFuture<'static, AppResult<Arc<TenantConnection>>>>;

enum Slot {
    Ready(Arc<TenantConnection>),
    /// In-flight attempt, tagged with the epoch it was spawned under so a
    /// finished task can tell its own slot from a successor's.
    Pending(u64, ConnectFuture),
}

/// Per-tenant connection cache.
///
/// The first request for a tenant opens the connection; concurrent requests
/// arriving while it is in flight await the same attempt instead of opening
/// their own. A failed attempt is not cached, so the next request retries.
pub struct ConnectionRegistry {
    connector: Arc<dyn DatabaseConnector>,
    slots: Arc<DashMap<String, Slot>>,
    epochs: AtomicU64,
}

impl ConnectionRegistry {
    /// Registry backed by the given connector
    #[must_use]
    pub fn new(connector: Arc<dyn DatabaseConnector>) -> Self {
        Self {
            connector,
            slots: Arc::new(DashMap::new()),
            epochs: AtomicU64::new(0),
        }
    }

    /// Get the tenant's connection, opening it on first use.
    ///
    /// `connection_string` is the plaintext URI; credential decryption is the
    /// caller's job ([`RequestRouter::resolve`](crate::router::RequestRouter::resolve)
    /// decrypts before calling in here), so cache keys and dialing never touch
    /// ciphertext.
    ///
    /// The connection attempt runs on a detached task, so a caller that
    /// gives up waiting does not abort the attempt for everyone else.
    pub async fn get_connection(
        &self,
        tenant_id: &str,
        connection_string: &str,
    ) -> AppResult<Arc<TenantConnection>> {
        if let Some(slot) = self.slots.get(tenant_id) {
            match slot.value() {
                Slot::Ready(connection) => return Ok(Arc::clone(connection)),
                Slot::Pending(_, pending) => {
                    let pending = pending.clone();
                    drop(slot);
                    return pending.await;
                }
            }
        }

        let pending = match self.slots.entry(tenant_id.to_owned()) {
            Entry::Occupied(occupied) => match occupied.get() {
                Slot::Ready(connection) => return Ok(Arc::clone(connection)),
                Slot::Pending(_, pending) => pending.clone(),
            },
            Entry::Vacant(vacant) => {
                let epoch = self.epochs.fetch_add(1, Ordering::Relaxed);
                let pending = self.spawn_connect(epoch, tenant_id, connection_string);
                vacant.insert(Slot::Pending(epoch, pending.clone()));
                pending
            }
        };
        pending.await
    }

    fn spawn_connect(&self, epoch: u64, tenant_id: &str, connection_string: &str) -> ConnectFuture {
        let connector = Arc::clone(&self.connector);
        let slots = Arc::clone(&self.slots);
        let tenant = tenant_id.to_owned();
        let uri = connection_string.to_owned();

        info!(
            tenant_id = %tenant,
            uri = %redact_connection_string(&uri),
            "Opening tenant database connection"
        );

        let task = tokio::spawn(async move {
            let database_name = extract_database_name(&uri, &tenant);
            let result = connector
                .connect(&uri, &database_name)
                .await
                .map(|database| Arc::new(TenantConnection::new(tenant.clone(), database)));

            match &result {
                Ok(connection) => {
                    // The slot may have been closed, or closed and replaced
                    // by a newer attempt, while we connected. Only fulfill
                    // our own pending slot; otherwise leave the map alone and
                    // let this handle die with its last holder.
                    if let Some(mut slot) = slots.get_mut(&tenant) {
                        if matches!(slot.value(), Slot::Pending(slot_epoch, _) if *slot_epoch == epoch)
                        {
                            *slot.value_mut() = Slot::Ready(Arc::clone(connection));
                        }
                    }
                    info!(tenant_id = %tenant, database = connection.database().name(), "Tenant connection established");
                }
                Err(error) => {
                    slots.remove_if(&tenant, |_, slot| {
                        matches!(slot, Slot::Pending(slot_epoch, _) if *slot_epoch == epoch)
                    });
                    warn!(tenant_id = %tenant, error = %error, "Tenant connection failed");
                }
            }
            result
        });

        task.map(|joined| {
            joined.unwrap_or_else(|e| {
                Err(AppError::internal(format!("Connection task failed: {e}")))
            })
        })
        .boxed()
        .shared()
    }

    /// Cached connection, if one is already established
    #[must_use]
    pub fn cached(&self, tenant_id: &str) -> Option<Arc<TenantConnection>> {
        self.slots.get(tenant_id).and_then(|slot| match slot.value() {
            Slot::Ready(connection) => Some(Arc::clone(connection)),
            Slot::Pending(..) => None,
        })
    }

    /// Drop the tenant's cached connection. Returns whether an entry existed;
    /// closing an unknown tenant is a no-op.
    pub fn close_connection(&self, tenant_id: &str) -> bool {
        let removed = self.slots.remove(tenant_id).is_some();
        if removed {
            debug!(tenant_id, "Closed tenant connection");
        }
        removed
    }

    /// Drop every cached connection
    pub fn close_all(&self) {
        let count = self.slots.len();
        self.slots.clear();
        if count > 0 {
            info!(count, "Closed all tenant connections");
        }
    }

    /// Number of cached or in-flight tenant entries
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots.len()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("active", &self.slots.len())
            .finish()
    }
}
