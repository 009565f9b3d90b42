// ABOUTME: Routes operations to the platform database or a tenant's database
// ABOUTME: Owns the platform handle and drives registry plus schema setup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cognix

use std::sync::Arc;

use tracing::info;

use crate::config::ServerConfig;
use crate::crypto::CredentialVault;
use crate::document::{DatabaseConnector, DocumentDatabase};
use crate::errors::{AppError, AppResult};
use crate::registry::ConnectionRegistry;
use crate::schema;

/// Which database an operation belongs to.
///
/// Identity and configuration live in the shared platform database; chat
/// and document data live in the tenant's own database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Shared platform data (tenant profiles, credentials)
    Platform,
    /// Per-tenant data behind the tenant's own connection string
    Tenant,
}

/// Per-process router over the platform handle and the tenant registry.
pub struct RequestRouter {
    platform: Arc<dyn DocumentDatabase>,
    registry: ConnectionRegistry,
    vault: Arc<CredentialVault>,
}

impl RequestRouter {
    /// Connect to the platform database, declare its indexes, and build the
    /// tenant registry. Called once at startup.
    pub async fn connect(
        config: &ServerConfig,
        connector: Arc<dyn DatabaseConnector>,
        vault: Arc<CredentialVault>,
    ) -> AppResult<Self> {
        let platform = connector
            .connect(&config.platform_database_url, &config.platform_database_name)
            .await?;
        schema::ensure_platform_schema(platform.as_ref()).await?;
        info!(database = platform.name(), "Platform database ready");

        Ok(Self {
            platform,
            registry: ConnectionRegistry::new(connector),
            vault,
        })
    }

    /// The shared platform database handle
    #[must_use]
    pub fn platform(&self) -> Arc<dyn DocumentDatabase> {
        Arc::clone(&self.platform)
    }

    /// The tenant connection registry
    #[must_use]
    pub const fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// The credential vault used for tenant secrets
    #[must_use]
    pub fn vault(&self) -> Arc<CredentialVault> {
        Arc::clone(&self.vault)
    }

    /// Resolve the database handle for an operation.
    ///
    /// Tenant operations need a non-empty tenant id and a decryptable
    /// connection string; a tenant that never configured one gets a
    /// configuration error, not a connection error, so callers can tell
    /// "set it up first" apart from "your database is down".
    pub async fn resolve(
        &self,
        tenant_id: Option<&str>,
        encrypted_connection: Option<&str>,
        kind: OperationKind,
    ) -> AppResult<Arc<dyn DocumentDatabase>> {
        match kind {
            OperationKind::Platform => Ok(Arc::clone(&self.platform)),
            OperationKind::Tenant => {
                let tenant_id = tenant_id
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| AppError::config("Tenant id required for tenant operations"))?;
                let connection_string = encrypted_connection
                    .map(|ciphertext| self.vault.decrypt(ciphertext))
                    .filter(|plaintext| !plaintext.is_empty())
                    .ok_or_else(|| AppError::config("Tenant database not configured"))?;

                let connection = self
                    .registry
                    .get_connection(tenant_id, &connection_string)
                    .await?;
                schema::ensure_tenant_schema(connection.as_ref()).await?;
                Ok(Arc::clone(connection.database()))
            }
        }
    }

    /// Drop a tenant's cached connection, e.g. after its connection string
    /// changed. Unknown tenants are a no-op.
    pub fn disconnect_tenant(&self, tenant_id: &str) -> bool {
        self.registry.close_connection(tenant_id)
    }

    /// Close every tenant connection at process teardown
    pub fn shutdown(&self) {
        self.registry.close_all();
        info!("Router shut down");
    }
}

impl std::fmt::Debug for RequestRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestRouter")
            .field("platform", &self.platform.name())
            .field("registry", &self.registry)
            .finish()
    }
}
