// ABOUTME: Tracing subscriber setup for embedding binaries and tests
// ABOUTME: RUST_LOG overrides the default level when set
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cognix

use tracing_subscriber::EnvFilter;

use crate::errors::{AppError, AppResult};

/// Initialize the global tracing subscriber.
///
/// `default_level` applies when `RUST_LOG` is unset. Call once per process.
///
/// # Errors
///
/// Returns an internal error if a global subscriber is already installed.
pub fn init_logging(default_level: &str) -> AppResult<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| AppError::internal(format!("Failed to initialize logging: {e}")))
}
