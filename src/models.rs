// ABOUTME: Persisted record types for the platform and tenant databases
// ABOUTME: Tenant profiles hold only ciphertext credentials, never plaintext
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cognix

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tenant identity record in the platform `users` collection.
///
/// `connection_string` and every `api_keys` value are stored as
/// [`crate::crypto::CredentialVault`] ciphertext; the plaintext exists only
/// transiently in memory while a request runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantProfile {
    /// Store-assigned identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Login email, unique across the platform
    pub email: String,
    /// Password hash produced by the auth layer
    pub password_hash: String,
    /// Per-provider API keys, each value encrypted
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
    /// Encrypted connection string for the tenant's own database, if set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    /// Preferred model provider
    pub preferred_provider: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl TenantProfile {
    /// Fresh profile with no credentials configured
    #[must_use]
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            email: email.into(),
            password_hash: password_hash.into(),
            api_keys: HashMap::new(),
            connection_string: None,
            preferred_provider: "openai".to_owned(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A chat session in a tenant's database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Tenant that owns the session
    pub owner_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One message within a chat session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub chat_id: String,
    pub content: String,
    /// Either "user" or "assistant"
    pub role: String,
    pub timestamp: DateTime<Utc>,
    /// Retrieved chunk ids that informed the reply, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_used: Option<Vec<String>>,
}

/// An uploaded document in a tenant's database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub chat_id: String,
    pub filename: String,
    pub file_type: String,
    pub file_size: u64,
    pub upload_date: DateTime<Utc>,
    /// One of "pending", "processing", "completed", "failed"
    pub processing_status: String,
}

/// A chunk of an uploaded document, optionally with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub document_id: String,
    pub chat_id: String,
    pub content: String,
    pub chunk_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}
