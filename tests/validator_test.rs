// ABOUTME: Integration tests for connection string validation
// ABOUTME: Scheme rejection without I/O and the CRUD smoke test sequence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cognix
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Result;
use cognix_server::validator::ConnectionValidator;
use common::MemoryConnector;

#[tokio::test]
async fn unrecognized_schemes_are_rejected_without_any_network_call() -> Result<()> {
    let connector = Arc::new(MemoryConnector::new());
    let validator = ConnectionValidator::new(connector.clone());

    for bad in [
        "http://internal-service:8080/admin",
        "postgres://localhost:5432/db",
        "file:///etc/passwd",
        "localhost:27017",
        "",
    ] {
        let result = validator.validate(bad, "tenant-a").await;
        assert!(!result.valid, "accepted {bad:?}");
        assert!(result.error.is_some());
        assert!(result.server_info.is_none());
    }
    assert_eq!(connector.connect_calls.load(Ordering::SeqCst), 0);

    let smoke = validator.smoke_test("tenant-a", "http://example.com").await;
    assert!(!smoke.success);
    assert!(smoke.operations_tested.is_empty());
    assert_eq!(connector.connect_calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn valid_strings_report_database_name_and_server_info() -> Result<()> {
    let connector = Arc::new(MemoryConnector::new());
    let validator = ConnectionValidator::new(connector);

    let result = validator
        .validate("mongodb://localhost:27017/testdb", "tenant-a")
        .await;
    assert!(result.valid);
    assert_eq!(result.database_name.as_deref(), Some("testdb"));
    let info = result.server_info.unwrap();
    assert!(info.get("version").is_some());

    Ok(())
}

#[tokio::test]
async fn pathless_strings_fall_back_to_the_derived_name() -> Result<()> {
    let connector = Arc::new(MemoryConnector::new());
    let validator = ConnectionValidator::new(connector);

    let result = validator
        .validate("mongodb://localhost:27017", "abc")
        .await;
    assert!(result.valid);
    assert_eq!(result.database_name.as_deref(), Some("cognix_tenant_abc"));
    Ok(())
}

#[tokio::test]
async fn unreachable_servers_fail_validation_with_a_cause() -> Result<()> {
    let connector = Arc::new(MemoryConnector::new());
    connector.fail_connects.store(true, Ordering::SeqCst);
    let validator = ConnectionValidator::new(connector);

    let result = validator
        .validate("mongodb://localhost:27017/testdb", "tenant-a")
        .await;
    assert!(!result.valid);
    assert!(result.error.unwrap().contains("connection"));
    Ok(())
}

#[tokio::test]
async fn smoke_test_runs_the_full_sequence_and_cleans_up() -> Result<()> {
    let connector = Arc::new(MemoryConnector::new());
    let validator = ConnectionValidator::new(connector.clone());

    let result = validator
        .smoke_test("tenant-a", "mongodb://localhost:27017/testdb")
        .await;
    assert!(result.success);
    assert_eq!(result.operations_tested, ["insert", "find", "update", "delete"]);
    assert!(result.error.is_none());

    let database = connector.database("testdb").unwrap();
    assert!(!database.has_collection("cognix_connection_probe"));
    Ok(())
}

#[tokio::test]
async fn a_mid_sequence_failure_still_cleans_up() -> Result<()> {
    let connector = Arc::new(MemoryConnector::new());
    let validator = ConnectionValidator::new(connector.clone());

    // Seed the database so the failure knob exists before the test runs
    let result = validator
        .validate("mongodb://localhost:27017/testdb", "tenant-a")
        .await;
    assert!(result.valid);
    let database = connector.database("testdb").unwrap();
    database.fail_updates.store(true, Ordering::SeqCst);

    let result = validator
        .smoke_test("tenant-a", "mongodb://localhost:27017/testdb")
        .await;
    assert!(!result.success);
    assert_eq!(result.operations_tested, ["insert", "find"]);
    assert!(result.error.is_some());
    assert!(!database.has_collection("cognix_connection_probe"));
    Ok(())
}
