// ABOUTME: Fixed names and bounds shared across the routing core
// ABOUTME: Collection names, timeouts, and the tenant database name prefix
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cognix

use std::time::Duration;

/// Bound on every network-facing call (connect, ping, CRUD probe).
/// There is no unbounded wait anywhere in this subsystem.
pub const NETWORK_TIMEOUT: Duration = Duration::from_secs(5);

/// Prefix for the derived tenant database name when the connection string
/// carries no path component: `cognix_tenant_<tenant_id>`.
pub const TENANT_DATABASE_PREFIX: &str = "cognix_tenant";

/// Scratch collection used by the connection smoke test; dropped after use
pub const SMOKE_TEST_COLLECTION: &str = "cognix_connection_probe";

/// Platform database collection holding tenant identity and credentials
pub const USERS_COLLECTION: &str = "users";

/// Tenant database collections
pub const CHAT_SESSIONS_COLLECTION: &str = "chat_sessions";
/// Messages within a chat session
pub const MESSAGES_COLLECTION: &str = "messages";
/// Uploaded documents
pub const DOCUMENTS_COLLECTION: &str = "documents";
/// Chunked document content for retrieval
pub const DOCUMENT_CHUNKS_COLLECTION: &str = "document_chunks";

/// URI schemes accepted for tenant connection strings: direct and
/// managed/cloud topologies. Anything else is rejected before any I/O.
pub const ACCEPTED_URI_SCHEMES: [&str; 2] = ["mongodb://", "mongodb+srv://"];
