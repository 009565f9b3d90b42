// ABOUTME: Field-level validation for tenant settings updates
// ABOUTME: Provider allow-list, API key shapes, email, password, and file limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Cognix

use crate::config::ServerConfig;
use crate::errors::{AppError, AppResult};

/// Model providers a tenant may select
pub const SUPPORTED_PROVIDERS: [&str; 5] = ["openai", "gemini", "groq", "mistral", "ollama"];

/// Whether the provider name is on the allow-list (case-insensitive)
#[must_use]
pub fn is_supported_provider(provider: &str) -> bool {
    let provider = provider.to_ascii_lowercase();
    SUPPORTED_PROVIDERS.contains(&provider.as_str())
}

/// Check an API key against the provider's known shape.
///
/// This catches paste errors (wrong field, truncation) early; it says
/// nothing about whether the key is actually live.
pub fn validate_api_key_format(provider: &str, api_key: &str) -> AppResult<()> {
    if api_key.is_empty() {
        return Err(AppError::validation("API key cannot be empty"));
    }

    match provider.to_ascii_lowercase().as_str() {
        "openai" => {
            if !api_key.starts_with("sk-") {
                return Err(AppError::validation("OpenAI API key must start with 'sk-'"));
            }
            if api_key.len() < 20 {
                return Err(AppError::validation("OpenAI API key is too short"));
            }
        }
        "gemini" => {
            if api_key.len() < 20 {
                return Err(AppError::validation("Gemini API key is too short"));
            }
        }
        "groq" => {
            if !api_key.starts_with("gsk_") {
                return Err(AppError::validation("Groq API key must start with 'gsk_'"));
            }
        }
        "mistral" => {
            if api_key.len() < 20 {
                return Err(AppError::validation("Mistral API key is too short"));
            }
        }
        // Local runtime, no key required
        "ollama" => {}
        other => {
            return Err(AppError::validation(format!(
                "Unsupported provider: {other}"
            )))
        }
    }
    Ok(())
}

/// Minimal shape check for email addresses
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// Password strength check. Returns every unmet rule, not just the first.
#[must_use]
pub fn validate_password(password: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if password.len() < 8 {
        errors.push("Password must be at least 8 characters long".to_owned());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter".to_owned());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter".to_owned());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one digit".to_owned());
    }
    errors
}

/// Whether the filename's extension is on the configured allow-list
#[must_use]
pub fn is_allowed_file_type(config: &ServerConfig, filename: &str) -> bool {
    let Some((_, extension)) = filename.rsplit_once('.') else {
        return false;
    };
    let extension = extension.to_ascii_lowercase();
    config
        .allowed_extension_list()
        .iter()
        .any(|allowed| allowed == &extension)
}

/// Whether the upload fits under the configured size limit
#[must_use]
pub const fn is_allowed_file_size(config: &ServerConfig, file_size: u64) -> bool {
    file_size <= config.max_file_size
}
