// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Normalised authentication errors.
//!
//! Every failed API call is folded into one of a closed set of codes so
//! callers can branch on `code` without knowing anything about HTTP.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed taxonomy of authentication failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthErrorCode {
    InvalidCredentials,
    AccountLocked,
    EmailAlreadyExists,
    WeakPassword,
    RateLimited,
    NetworkError,
    UnknownError,
}

impl AuthErrorCode {
    /// Map an HTTP status to its error code.
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            400 | 401 => AuthErrorCode::InvalidCredentials,
            403 => AuthErrorCode::AccountLocked,
            409 => AuthErrorCode::EmailAlreadyExists,
            422 => AuthErrorCode::WeakPassword,
            429 => AuthErrorCode::RateLimited,
            500..=599 => AuthErrorCode::NetworkError,
            _ => AuthErrorCode::UnknownError,
        }
    }

    /// Wire name of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthErrorCode::AccountLocked => "ACCOUNT_LOCKED",
            AuthErrorCode::EmailAlreadyExists => "EMAIL_ALREADY_EXISTS",
            AuthErrorCode::WeakPassword => "WEAK_PASSWORD",
            AuthErrorCode::RateLimited => "RATE_LIMITED",
            AuthErrorCode::NetworkError => "NETWORK_ERROR",
            AuthErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Message used when the server does not supply one.
    pub fn default_message(&self) -> &'static str {
        match self {
            AuthErrorCode::InvalidCredentials => "Invalid email or password",
            AuthErrorCode::AccountLocked => "Account is locked or access is forbidden",
            AuthErrorCode::EmailAlreadyExists => "An account with this email already exists",
            AuthErrorCode::WeakPassword => "Password does not meet the strength requirements",
            AuthErrorCode::RateLimited => "Too many attempts, please try again later",
            AuthErrorCode::NetworkError => "Network error, please check your connection",
            AuthErrorCode::UnknownError => "An unexpected error occurred",
        }
    }
}

impl std::fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalised authentication error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct AuthError {
    pub code: AuthErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

/// Error body shape returned by the API.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<Value>,
}

impl AuthError {
    /// Create an error with the code's default message.
    pub fn new(code: AuthErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// The request never produced a response (connect failure, timeout).
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AuthErrorCode::NetworkError).with_message(message)
    }

    /// Build from an HTTP error response.
    ///
    /// A JSON body carrying `message` and/or `details` overrides the
    /// defaults; any other body is ignored.
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        let mut error = Self::new(AuthErrorCode::from_status(status));
        let body: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
        if let Some(message) = body.message.filter(|m| !m.trim().is_empty()) {
            error.message = message;
        }
        error.details = body.details;
        error
    }

    /// Get the error code as its wire string.
    pub fn error_code(&self) -> &'static str {
        self.code.as_str()
    }
}
