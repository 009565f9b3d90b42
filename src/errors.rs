// ABOUTME: Unified error handling with structured error kinds for the routing core
// ABOUTME: Separates client-caused configuration errors from transient connectivity failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cognix

use thiserror::Error;

/// Result alias used across the crate
pub type AppResult<T> = Result<T, AppError>;

/// Application error with a structured kind and message.
///
/// Callers receive these instead of raw driver errors, so nothing outside
/// the `mongo` module needs to know which database technology backs a
/// handle. The enum is `Clone` because a single in-flight connection
/// attempt fans its result out to every waiter.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Client-caused configuration problem (missing tenant id, missing or
    /// undecryptable connection string, unsupported URI scheme). Never
    /// retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Target unreachable or timed out. Transient; callers may retry with
    /// backoff, this crate never retries on its own.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Target reachable but credentials rejected. Terminal.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Malformed identifier or filter. Fails fast, no network call made.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unexpected internal failure (crypto setup, task join, serialization)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether a retry with backoff could reasonably succeed.
    ///
    /// Only connectivity failures are transient; configuration, auth, and
    /// validation errors will fail identically on every attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Short machine-readable kind, used in log fields and API payloads
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Connection(_) => "connection",
            Self::Auth(_) => "auth",
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
        }
    }
}
