// ABOUTME: Tenant settings updates with per-field validation outcomes
// ABOUTME: Valid fields are encrypted and applied even when others fail
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cognix

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{error, info, warn};

use crate::constants::USERS_COLLECTION;
use crate::crypto::CredentialVault;
use crate::errors::{AppError, AppResult};
use crate::models::TenantProfile;
use crate::router::RequestRouter;
use crate::schema;
use crate::store::DocumentStore;
use crate::validation;
use crate::validator::ConnectionValidator;

/// Requested settings changes. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantSettingsUpdate {
    /// Per-provider API keys to add or replace (plaintext)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_keys: Option<HashMap<String, String>>,
    /// Connection string for the tenant's own database (plaintext)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    /// Preferred model provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_provider: Option<String>,
}

/// Outcome of one field in an update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldOutcome {
    /// Whether the field was accepted and applied
    pub valid: bool,
    /// Rejection cause, when invalid
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FieldOutcome {
    fn accepted() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    fn rejected(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

/// Result of an update: which fields were applied plus per-field detail.
/// One invalid field never blocks the others.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsUpdateResult {
    /// Whether the profile write went through
    pub success: bool,
    /// Names of the profile fields that were written
    pub updated_fields: Vec<String>,
    /// Per-provider API key outcomes
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub api_keys: HashMap<String, FieldOutcome>,
    /// Connection string outcome, when one was submitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<Value>,
    /// Preferred provider outcome, when one was submitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_provider: Option<FieldOutcome>,
}

/// Applies tenant settings changes: validate each field, encrypt what is
/// accepted, persist to the platform database, and warm the tenant's
/// connection when a new connection string passes its probe.
pub struct TenantSettingsService {
    router: Arc<RequestRouter>,
    validator: ConnectionValidator,
}

impl TenantSettingsService {
    /// Service over the given router; the validator shares the router's
    /// connector but none of its cache.
    #[must_use]
    pub fn new(router: Arc<RequestRouter>, validator: ConnectionValidator) -> Self {
        Self { router, validator }
    }

    fn profiles(&self) -> DocumentStore<TenantProfile> {
        DocumentStore::new(self.router.platform(), USERS_COLLECTION)
    }

    /// Apply an update, returning per-field outcomes.
    pub async fn apply_update(
        &self,
        tenant_id: &str,
        update: TenantSettingsUpdate,
    ) -> AppResult<SettingsUpdateResult> {
        let vault = self.router.vault();
        let mut fields = Map::new();
        fields.insert("updated_at".to_owned(), json!(Utc::now()));

        let mut result = SettingsUpdateResult {
            success: false,
            updated_fields: Vec::new(),
            api_keys: HashMap::new(),
            connection: None,
            preferred_provider: None,
        };

        if let Some(api_keys) = update.api_keys {
            let accepted = self.apply_api_keys(tenant_id, api_keys, &vault, &mut result).await?;
            if let Some(merged) = accepted {
                fields.insert("api_keys".to_owned(), json!(merged));
            }
        }

        if let Some(connection_string) = update.connection_string {
            if self
                .apply_connection_string(tenant_id, &connection_string, &mut result)
                .await
            {
                fields.insert(
                    "connection_string".to_owned(),
                    json!(vault.encrypt(&connection_string)?),
                );
            }
        }

        if let Some(provider) = update.preferred_provider {
            if validation::is_supported_provider(&provider) {
                fields.insert(
                    "preferred_provider".to_owned(),
                    json!(provider.to_ascii_lowercase()),
                );
                result.preferred_provider = Some(FieldOutcome::accepted());
            } else {
                result.preferred_provider =
                    Some(FieldOutcome::rejected(format!("Unsupported provider: {provider}")));
            }
        }

        result.updated_fields = fields.keys().cloned().collect();
        let found = self
            .profiles()
            .update(tenant_id, Value::Object(fields))
            .await?;
        if !found {
            return Err(AppError::not_found(format!("Tenant not found: {tenant_id}")));
        }

        result.success = true;
        info!(tenant_id, fields = ?result.updated_fields, "Tenant settings updated");
        Ok(result)
    }

    /// Validate each submitted key; encrypt and merge the accepted ones over
    /// the profile's existing keys. Returns the merged ciphertext map, or
    /// `None` when nothing was accepted.
    async fn apply_api_keys(
        &self,
        tenant_id: &str,
        api_keys: HashMap<String, String>,
        vault: &CredentialVault,
        result: &mut SettingsUpdateResult,
    ) -> AppResult<Option<HashMap<String, String>>> {
        let mut accepted = HashMap::new();
        for (provider, api_key) in api_keys {
            match validation::validate_api_key_format(&provider, &api_key) {
                Ok(()) => {
                    accepted.insert(provider.clone(), vault.encrypt(&api_key)?);
                    result.api_keys.insert(provider, FieldOutcome::accepted());
                }
                Err(error) => {
                    warn!(tenant_id, provider = %provider, error = %error, "Rejected API key");
                    result
                        .api_keys
                        .insert(provider, FieldOutcome::rejected(error.to_string()));
                }
            }
        }
        if accepted.is_empty() {
            return Ok(None);
        }

        let mut merged = self
            .profiles()
            .get(tenant_id)
            .await?
            .map(|profile| profile.api_keys)
            .unwrap_or_default();
        merged.extend(accepted);
        Ok(Some(merged))
    }

    /// Probe and smoke-test a submitted connection string. On success, warm
    /// the registry and declare the tenant's schema. Returns whether the
    /// string should be persisted.
    async fn apply_connection_string(
        &self,
        tenant_id: &str,
        connection_string: &str,
        result: &mut SettingsUpdateResult,
    ) -> bool {
        let validation = self.validator.validate(connection_string, tenant_id).await;
        if !validation.valid {
            result.connection = serde_json::to_value(&validation).ok();
            return false;
        }

        let smoke = self.validator.smoke_test(tenant_id, connection_string).await;
        let mut report = serde_json::to_value(&validation).unwrap_or_else(|_| json!({}));
        if let Some(object) = report.as_object_mut() {
            object.insert("success".to_owned(), json!(smoke.success));
            object.insert("operations_tested".to_owned(), json!(smoke.operations_tested));
            if let Some(error) = &smoke.error {
                object.insert("error".to_owned(), json!(error));
            }
        }
        if !smoke.success {
            result.connection = Some(report);
            return false;
        }

        // A string that changed invalidates any cached connection
        self.router.disconnect_tenant(tenant_id);
        match self
            .router
            .registry()
            .get_connection(tenant_id, connection_string)
            .await
        {
            Ok(connection) => {
                let initialized = match schema::ensure_tenant_schema(connection.as_ref()).await {
                    Ok(()) => json!({ "success": true }),
                    Err(error) => {
                        error!(tenant_id, error = %error, "Tenant schema setup failed");
                        json!({ "success": false, "error": error.to_string() })
                    }
                };
                if let Some(object) = report.as_object_mut() {
                    object.insert("database_initialization".to_owned(), initialized);
                }
            }
            Err(error) => {
                // Validation already passed; persist the string and let
                // routing retry the connection later.
                error!(tenant_id, error = %error, "Could not warm tenant connection");
            }
        }

        result.connection = Some(report);
        true
    }

    /// Decrypted connection string for a tenant, or `None` when unset or
    /// undecryptable.
    pub async fn load_connection_string(&self, tenant_id: &str) -> AppResult<Option<String>> {
        let profile = self.profiles().get(tenant_id).await?;
        Ok(profile
            .and_then(|p| p.connection_string)
            .map(|ciphertext| self.router.vault().decrypt(&ciphertext))
            .filter(|plaintext| !plaintext.is_empty()))
    }

    /// Decrypted API key for one provider, or `None` when unset or
    /// undecryptable.
    pub async fn load_api_key(&self, tenant_id: &str, provider: &str) -> AppResult<Option<String>> {
        let profile = self.profiles().get(tenant_id).await?;
        Ok(profile
            .and_then(|p| p.api_keys.get(provider).cloned())
            .map(|ciphertext| self.router.vault().decrypt(&ciphertext))
            .filter(|plaintext| !plaintext.is_empty()))
    }

    /// Remove one provider's API key from the profile
    pub async fn delete_api_key(&self, tenant_id: &str, provider: &str) -> AppResult<bool> {
        let Some(profile) = self.profiles().get(tenant_id).await? else {
            return Ok(false);
        };
        let mut api_keys = profile.api_keys;
        if api_keys.remove(provider).is_none() {
            return Ok(false);
        }
        self.profiles()
            .update(
                tenant_id,
                json!({ "api_keys": api_keys, "updated_at": Utc::now() }),
            )
            .await
    }
}
