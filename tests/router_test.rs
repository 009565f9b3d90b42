// ABOUTME: Integration tests for platform versus tenant routing
// ABOUTME: Unconfigured tenants get configuration errors, not connection errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cognix
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Result;
use cognix_server::config::ServerConfig;
use cognix_server::crypto::{generate_encryption_key, CredentialVault};
use cognix_server::errors::AppError;
use cognix_server::router::{OperationKind, RequestRouter};
use common::MemoryConnector;

const TENANT_URI: &str = "mongodb://localhost:27017/tenant_db";

async fn build_router(connector: Arc<MemoryConnector>) -> Result<RequestRouter> {
    common::init_test_logging();
    let config = ServerConfig::default();
    let vault = Arc::new(CredentialVault::new(generate_encryption_key()?));
    Ok(RequestRouter::connect(&config, connector, vault).await?)
}

#[tokio::test]
async fn startup_bootstraps_the_platform_database() -> Result<()> {
    let connector = Arc::new(MemoryConnector::new());
    let router = build_router(connector.clone()).await?;

    assert_eq!(router.platform().name(), "cognix_platform");
    // Platform indexes were declared during bootstrap
    let platform = connector.database("cognix_platform").unwrap();
    assert!(platform.index_calls.load(Ordering::SeqCst) >= 2);
    Ok(())
}

#[tokio::test]
async fn platform_operations_use_the_shared_handle() -> Result<()> {
    let connector = Arc::new(MemoryConnector::new());
    let router = build_router(connector).await?;

    let resolved = router.resolve(None, None, OperationKind::Platform).await?;
    assert!(Arc::ptr_eq(&resolved, &router.platform()));
    Ok(())
}

#[tokio::test]
async fn tenant_operations_without_a_tenant_id_are_a_config_error() -> Result<()> {
    let connector = Arc::new(MemoryConnector::new());
    let router = build_router(connector.clone()).await?;

    let error = router
        .resolve(None, None, OperationKind::Tenant)
        .await
        .err()
        .unwrap();
    assert!(matches!(error, AppError::Config(_)));

    let error = router
        .resolve(Some(""), None, OperationKind::Tenant)
        .await
        .err()
        .unwrap();
    assert!(matches!(error, AppError::Config(_)));

    // Only the platform bootstrap connected; no tenant attempt was made
    assert_eq!(connector.connect_calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn an_unconfigured_connection_string_is_a_config_error() -> Result<()> {
    let connector = Arc::new(MemoryConnector::new());
    let router = build_router(connector).await?;

    let error = router
        .resolve(Some("tenant-a"), None, OperationKind::Tenant)
        .await
        .err()
        .unwrap();
    assert!(matches!(error, AppError::Config(_)));

    // Undecryptable ciphertext behaves exactly like an absent one
    let error = router
        .resolve(Some("tenant-a"), Some("not-real-ciphertext"), OperationKind::Tenant)
        .await
        .err()
        .unwrap();
    assert!(matches!(error, AppError::Config(_)));
    Ok(())
}

#[tokio::test]
async fn tenant_resolution_connects_and_declares_schema_once() -> Result<()> {
    let connector = Arc::new(MemoryConnector::new());
    let router = build_router(connector.clone()).await?;
    let ciphertext = router.vault().encrypt(TENANT_URI)?;

    let first = router
        .resolve(Some("tenant-a"), Some(&ciphertext), OperationKind::Tenant)
        .await?;
    assert_eq!(first.name(), "tenant_db");

    let tenant_db = connector.database("tenant_db").unwrap();
    let declared = tenant_db.index_calls.load(Ordering::SeqCst);
    assert!(declared > 0);

    let second = router
        .resolve(Some("tenant-a"), Some(&ciphertext), OperationKind::Tenant)
        .await?;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(tenant_db.index_calls.load(Ordering::SeqCst), declared);
    // One platform connect plus one tenant connect
    assert_eq!(connector.connect_calls.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn disconnecting_a_tenant_forces_a_fresh_connection() -> Result<()> {
    let connector = Arc::new(MemoryConnector::new());
    let router = build_router(connector.clone()).await?;
    let ciphertext = router.vault().encrypt(TENANT_URI)?;

    router
        .resolve(Some("tenant-a"), Some(&ciphertext), OperationKind::Tenant)
        .await?;
    assert!(router.disconnect_tenant("tenant-a"));
    assert!(!router.disconnect_tenant("tenant-a"));

    router
        .resolve(Some("tenant-a"), Some(&ciphertext), OperationKind::Tenant)
        .await?;
    assert_eq!(connector.connect_calls.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn shutdown_clears_every_tenant_connection() -> Result<()> {
    let connector = Arc::new(MemoryConnector::new());
    let router = build_router(connector).await?;
    let ciphertext = router.vault().encrypt(TENANT_URI)?;

    router
        .resolve(Some("tenant-a"), Some(&ciphertext), OperationKind::Tenant)
        .await?;
    assert_eq!(router.registry().active_count(), 1);

    router.shutdown();
    assert_eq!(router.registry().active_count(), 0);
    Ok(())
}
