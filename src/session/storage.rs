// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cookie-backed session store.
//!
//! ## Cookie Layout
//!
//! | Cookie | Content | Max-Age |
//! |--------|---------|---------|
//! | `auth_access_token` | Raw access token | 24 h |
//! | `auth_refresh_token` | Raw refresh token | 7 d |
//! | `auth_session_data` | JSON [`SessionMetadata`] | 24 h |
//!
//! Cookies are `SameSite=Strict`, path `/`, `Secure` in production, and not
//! `HttpOnly`: the context layer must be able to read them.
//!
//! Reads fail closed: a missing cookie means "no session", and anything that
//! does not parse or validate wipes all three cookies.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::cookies::{CookieJar, CookieOptions};
use super::data::{SessionData, SessionMetadata};
use super::error::SessionResult;
use crate::clock::{Clock, SystemClock};

pub const ACCESS_TOKEN_COOKIE: &str = "auth_access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "auth_refresh_token";
pub const SESSION_DATA_COOKIE: &str = "auth_session_data";

/// Access token and metadata cookie lifetime.
pub const SESSION_COOKIE_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Refresh token cookie lifetime.
pub const REFRESH_COOKIE_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Session store over a cookie jar.
///
/// Cheap to clone; clones share the jar and clock.
#[derive(Clone)]
pub struct SessionStorage {
    jar: Arc<dyn CookieJar>,
    clock: Arc<dyn Clock>,
    secure: bool,
}

impl SessionStorage {
    /// Create a store using the system clock.
    pub fn new(jar: Arc<dyn CookieJar>) -> Self {
        Self::with_clock(jar, Arc::new(SystemClock))
    }

    pub fn with_clock(jar: Arc<dyn CookieJar>, clock: Arc<dyn Clock>) -> Self {
        Self {
            jar,
            clock,
            secure: false,
        }
    }

    /// Mark cookies `Secure` (production deployments).
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn options(&self, max_age: Duration) -> CookieOptions {
        CookieOptions::with_max_age(max_age).secure(self.secure)
    }

    /// Persist a session into the three session cookies.
    pub fn store(&self, session: &SessionData) -> SessionResult<()> {
        let metadata = serde_json::to_string(&session.metadata())?;

        self.jar.set(
            ACCESS_TOKEN_COOKIE,
            &session.access_token,
            &self.options(SESSION_COOKIE_MAX_AGE),
        )?;
        self.jar.set(
            REFRESH_TOKEN_COOKIE,
            &session.refresh_token,
            &self.options(REFRESH_COOKIE_MAX_AGE),
        )?;
        self.jar.set(
            SESSION_DATA_COOKIE,
            &metadata,
            &self.options(SESSION_COOKIE_MAX_AGE),
        )?;

        debug!(user_id = %session.user_id, "Session stored");
        Ok(())
    }

    /// Read the stored session, if all three cookies are present and valid.
    pub fn get_stored(&self) -> Option<SessionData> {
        let access_token = self.jar.get(ACCESS_TOKEN_COOKIE)?;
        let refresh_token = self.jar.get(REFRESH_TOKEN_COOKIE)?;
        let raw_metadata = self.jar.get(SESSION_DATA_COOKIE)?;

        let metadata: SessionMetadata = match serde_json::from_str(&raw_metadata) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(error = %e, "Stored session metadata is corrupt, clearing session");
                self.clear();
                return None;
            }
        };

        let session = SessionData::from_parts(access_token, refresh_token, metadata);
        if let Err(e) = session.validate() {
            warn!(error = %e, "Stored session failed validation, clearing session");
            self.clear();
            return None;
        }

        Some(session)
    }

    /// Delete all session cookies. Never fails; jar errors are logged.
    pub fn clear(&self) {
        for name in [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, SESSION_DATA_COOKIE] {
            if let Err(e) = self.jar.remove(name) {
                warn!(cookie = name, error = %e, "Failed to remove session cookie");
            }
        }
    }

    /// Whether a stored session exists, its token is unexpired and the
    /// session itself has not passed `expires_at`.
    pub fn is_valid(&self) -> bool {
        let now = self.clock.now();
        self.get_stored().is_some_and(|session| session.is_valid_at(now))
    }

    /// Whether the stored access token is within the refresh window.
    pub fn should_refresh(&self) -> bool {
        let now = self.clock.now();
        self.get_stored().is_some_and(|session| session.should_refresh_at(now))
    }

    /// Stamp `last_activity = now` on the stored session, if any.
    pub fn update_activity(&self) -> SessionResult<()> {
        let Some(mut session) = self.get_stored() else {
            return Ok(());
        };
        session.last_activity = self.clock.now();
        self.store(&session)
    }

    /// Raw access token cookie.
    pub fn access_token(&self) -> Option<String> {
        self.jar.get(ACCESS_TOKEN_COOKIE)
    }

    /// Raw refresh token cookie.
    pub fn refresh_token(&self) -> Option<String> {
        self.jar.get(REFRESH_TOKEN_COOKIE)
    }
}

impl std::fmt::Debug for SessionStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStorage")
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}
