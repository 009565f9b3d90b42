// ABOUTME: Environment-only server configuration for the routing core
// ABOUTME: Platform database location, encryption key material, and upload limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cognix

use std::env;

use tracing::warn;

/// Default platform database URI for local development
const DEFAULT_PLATFORM_URL: &str = "mongodb://localhost:27017";
/// Default platform database name
const DEFAULT_PLATFORM_DATABASE: &str = "cognix_platform";
/// Default maximum upload size (10 MB)
const DEFAULT_MAX_FILE_SIZE: u64 = 10_485_760;
/// Default allowed upload extensions
const DEFAULT_ALLOWED_EXTENSIONS: &str = "pdf,docx,txt";

/// Process-wide configuration, loaded once at startup from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// URI of the platform database (identity and credential storage)
    pub platform_database_url: String,
    /// Logical name of the platform database
    pub platform_database_name: String,
    /// Base64-encoded 32-byte symmetric key for the credential vault.
    /// Optional: a per-process key is generated when absent, meaning
    /// secrets written in that run are unreadable after restart.
    pub encryption_key: Option<String>,
    /// Maximum accepted upload size in bytes (consumed by the document
    /// upload collaborator, configured here)
    pub max_file_size: u64,
    /// Comma-separated allowed upload extensions
    pub allowed_extensions: String,
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to
    /// development defaults for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        let max_file_size = env::var("MAX_FILE_SIZE")
            .ok()
            .and_then(|v| {
                v.parse().map_or_else(
                    |_| {
                        warn!("MAX_FILE_SIZE is not a number, using default");
                        None
                    },
                    Some,
                )
            })
            .unwrap_or(DEFAULT_MAX_FILE_SIZE);

        Self {
            platform_database_url: env::var("PLATFORM_MONGODB_URL")
                .unwrap_or_else(|_| DEFAULT_PLATFORM_URL.to_owned()),
            platform_database_name: env::var("PLATFORM_DATABASE_NAME")
                .unwrap_or_else(|_| DEFAULT_PLATFORM_DATABASE.to_owned()),
            encryption_key: env::var("ENCRYPTION_KEY").ok().filter(|k| !k.is_empty()),
            max_file_size,
            allowed_extensions: env::var("ALLOWED_EXTENSIONS")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_EXTENSIONS.to_owned()),
        }
    }

    /// Allowed upload extensions as a normalized (lowercased, trimmed) list
    #[must_use]
    pub fn allowed_extension_list(&self) -> Vec<String> {
        self.allowed_extensions
            .split(',')
            .map(|ext| ext.trim().to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            platform_database_url: DEFAULT_PLATFORM_URL.to_owned(),
            platform_database_name: DEFAULT_PLATFORM_DATABASE.to_owned(),
            encryption_key: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.to_owned(),
        }
    }
}
