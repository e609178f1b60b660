// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session storage errors.

use std::io;

/// Error type for session storage operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// I/O error in a file-backed cookie jar
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Session data failed validation
    #[error("Invalid session: {0}")]
    Invalid(String),

    /// Cookie jar lock was poisoned
    #[error("Cookie jar unavailable")]
    Poisoned,
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
