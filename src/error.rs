// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Crate-level error type.
//!
//! API failures arrive as a normalised [`AuthError`]. A success response
//! whose body does not match the expected schema is a different kind of
//! failure and is reported as [`ClientError::InvalidResponse`], not folded
//! into the auth taxonomy.

use crate::auth::{AuthError, AuthErrorCode};
use crate::config::ConfigError;
use crate::session::SessionError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Normalised API failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Success response that failed schema validation
    #[error("invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("session storage error: {0}")]
    Session(#[from] SessionError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Http(String),
}

impl ClientError {
    pub fn invalid_response(endpoint: impl ToString, reason: impl ToString) -> Self {
        Self::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        }
    }

    /// The auth code, when this is a normalised API failure.
    pub fn auth_code(&self) -> Option<AuthErrorCode> {
        match self {
            ClientError::Auth(e) => Some(e.code),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_code_only_for_auth_errors() {
        let auth: ClientError = AuthError::new(AuthErrorCode::RateLimited).into();
        assert_eq!(auth.auth_code(), Some(AuthErrorCode::RateLimited));

        let invalid = ClientError::invalid_response("GET /auth/me", "missing field `id`");
        assert_eq!(invalid.auth_code(), None);
        assert_eq!(
            invalid.to_string(),
            "invalid response from GET /auth/me: missing field `id`"
        );
    }

    #[test]
    fn auth_errors_display_transparently() {
        let err: ClientError = AuthError::network("timed out").into();
        assert_eq!(err.to_string(), "NETWORK_ERROR: timed out");
    }
}
