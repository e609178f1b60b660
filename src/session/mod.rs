// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Storage Module
//!
//! Persists the client session (tokens plus user metadata) in cookies and
//! reads it back with strict validation.
//!
//! ## Consistency Model
//!
//! - The three cookies are written one after another with no transaction
//! - A partially written triple reads as "no session"
//! - Anything that fails to parse or validate is wiped (fail-closed)

pub mod cookies;
pub mod data;
pub mod error;
pub mod storage;

pub use cookies::{CookieJar, CookieOptions, FileCookieJar, MemoryCookieJar, SameSite};
pub use data::{SessionData, SessionMetadata};
pub use error::{SessionError, SessionResult};
pub use storage::{
    SessionStorage, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, SESSION_DATA_COOKIE,
};
