// ABOUTME: Library entry point for the Cognix multi-tenant backend core
// ABOUTME: Routes requests to the platform database or per-tenant user databases
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cognix

#![deny(unsafe_code)]

//! # Cognix Server Core
//!
//! Connection routing and lifecycle subsystem for a multi-tenant backend in
//! which every tenant supplies their own document database connection string.
//! The platform owns a single shared database for identity and credential
//! storage; each tenant's data lives in a database the platform never
//! provisions and only reaches through the (encrypted) connection string the
//! tenant configured.
//!
//! ## Architecture
//!
//! - **`crypto`**: symmetric encryption of secrets at rest (connection
//!   strings, provider API keys)
//! - **`registry`**: cache + single-flight construction of live tenant
//!   connections
//! - **`schema`**: idempotent per-tenant collection/index setup
//! - **`validator`**: safe probing of untrusted connection strings
//! - **`router`**: platform-vs-tenant database selection per operation
//! - **`store`**: typed CRUD over whichever database the router resolved
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use cognix_server::config::ServerConfig;
//! use cognix_server::crypto::CredentialVault;
//! use cognix_server::errors::AppResult;
//! use cognix_server::mongo::MongoConnector;
//! use cognix_server::router::RequestRouter;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env();
//!     let vault = Arc::new(CredentialVault::from_configured_key(
//!         config.encryption_key.as_deref(),
//!     )?);
//!     let router =
//!         RequestRouter::connect(&config, Arc::new(MongoConnector::new()), vault).await?;
//!     println!("Platform database ready: {}", router.platform().name());
//!     Ok(())
//! }
//! ```

/// Environment-based configuration
pub mod config;

/// Application constants and fixed names
pub mod constants;

/// Credential vault: symmetric encryption of secrets at rest
pub mod crypto;

/// Database seam: backend-agnostic document database traits
pub mod document;

/// Unified error handling with structured error kinds
pub mod errors;

/// Tracing subscriber setup for embedders and tests
pub mod logging;

/// Persisted record shapes for the platform and tenant databases
pub mod models;

/// MongoDB implementation of the document database seam
pub mod mongo;

/// Tenant connection cache with single-flight construction
pub mod registry;

/// Request routing between the platform and tenant databases
pub mod router;

/// Idempotent per-tenant index and collection setup
pub mod schema;

/// Tenant configuration-update flow with per-field validation
pub mod settings;

/// Generic typed document store over a resolved database handle
pub mod store;

/// Connection string parsing, scheme checks, and redaction
pub mod uri;

/// Untrusted connection string validation pipeline
pub mod validator;

/// Field-level validators for providers, API keys, and uploads
pub mod validation;
