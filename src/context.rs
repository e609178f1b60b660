// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Auth Context
//!
//! Holds the client's view of "who is signed in" and keeps it consistent
//! with the stored session.
//!
//! ## States
//!
//! ```text
//!            initialize()
//! Loading ───────────────┬──> Authenticated ──logout()/expiry──┐
//!                        │                                     v
//!                        └──────────────────────────> Unauthenticated
//! ```
//!
//! Failures always land in `Unauthenticated` with storage cleared; the
//! context is never left `Loading` and never half-authenticated.
//!
//! The context is an ordinary value: create one per session owner and share
//! it behind an `Arc`. Nothing here is global.

use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::api::{AuthResponse, TokenPair};
use crate::auth::{AuthError, AuthErrorCode, AuthUser};
use crate::error::{ClientError, ClientResult};
use crate::session::{SessionData, SessionResult, SessionStorage};

/// Default minimum spacing between activity writes.
pub const DEFAULT_ACTIVITY_THROTTLE: Duration = Duration::from_secs(5);

/// Exchanges a refresh token for a new token pair.
#[async_trait]
pub trait SessionRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> ClientResult<TokenPair>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthStatus {
    #[default]
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Point-in-time copy of the context state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthSnapshot {
    pub status: AuthStatus,
    pub user: Option<AuthUser>,
    pub error: Option<AuthError>,
    pub session_expires_at: Option<DateTime<Utc>>,
}

impl AuthSnapshot {
    fn unauthenticated() -> Self {
        Self {
            status: AuthStatus::Unauthenticated,
            ..Self::default()
        }
    }
}

/// Result of [`AuthContext::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// A stored session was restored.
    Restored { needs_refresh: bool },
    /// No usable session; storage was cleared.
    Cleared,
}

/// Result of [`AuthContext::check_session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCheck {
    /// Not authenticated; nothing to check.
    Inactive,
    Valid,
    /// Still valid but inside the refresh window.
    RefreshDue,
    /// The session was no longer valid and has been ended.
    Expired,
}

pub struct AuthContext {
    storage: SessionStorage,
    refresher: Option<Arc<dyn SessionRefresher>>,
    activity_throttle: Duration,
    state: RwLock<AuthSnapshot>,
    last_activity_write: Mutex<Option<DateTime<Utc>>>,
}

impl AuthContext {
    /// Create a context in the `Loading` state. Call [`initialize`](Self::initialize)
    /// to restore any stored session.
    pub fn new(storage: SessionStorage) -> Self {
        Self {
            storage,
            refresher: None,
            activity_throttle: DEFAULT_ACTIVITY_THROTTLE,
            state: RwLock::new(AuthSnapshot::default()),
            last_activity_write: Mutex::new(None),
        }
    }

    pub fn with_refresher(mut self, refresher: Arc<dyn SessionRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Minimum spacing between activity writes. Zero writes on every event.
    pub fn with_activity_throttle(mut self, throttle: Duration) -> Self {
        self.activity_throttle = throttle;
        self
    }

    pub fn storage(&self) -> &SessionStorage {
        &self.storage
    }

    fn read_state(&self) -> RwLockReadGuard<'_, AuthSnapshot> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, AuthSnapshot> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn now(&self) -> DateTime<Utc> {
        self.storage.clock().now()
    }

    // ========== State Accessors ==========

    pub fn snapshot(&self) -> AuthSnapshot {
        self.read_state().clone()
    }

    pub fn status(&self) -> AuthStatus {
        self.read_state().status
    }

    pub fn is_authenticated(&self) -> bool {
        self.status() == AuthStatus::Authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.status() == AuthStatus::Loading
    }

    pub fn user(&self) -> Option<AuthUser> {
        self.read_state().user.clone()
    }

    pub fn error(&self) -> Option<AuthError> {
        self.read_state().error.clone()
    }

    // ========== Transitions ==========

    /// Restore the stored session, if there is a usable one.
    ///
    /// The restored user comes from the session metadata and is only
    /// accepted if the access token's subject names the same user. It is
    /// not re-verified against the server.
    pub fn initialize(&self) -> InitOutcome {
        self.write_state().status = AuthStatus::Loading;

        let now = self.now();
        let restored = self
            .storage
            .get_stored()
            .filter(|session| session.is_valid_at(now) && session.token_matches_user());

        match restored {
            Some(session) => {
                let needs_refresh = session.should_refresh_at(now);
                info!(
                    user_id = %session.user_id,
                    expires_at = %session.expires_at,
                    needs_refresh,
                    "Restored stored session"
                );
                *self.write_state() = AuthSnapshot {
                    status: AuthStatus::Authenticated,
                    user: Some(session.user()),
                    error: None,
                    session_expires_at: Some(session.expires_at),
                };
                InitOutcome::Restored { needs_refresh }
            }
            None => {
                debug!("No usable stored session");
                self.storage.clear();
                *self.write_state() = AuthSnapshot::unauthenticated();
                InitOutcome::Cleared
            }
        }
    }

    /// Mark `user` as signed in.
    ///
    /// Persists nothing: the caller stores `session` beforehand (see
    /// [`establish_session`](Self::establish_session)).
    pub fn login(&self, user: AuthUser, session: &SessionData) {
        info!(user_id = %user.id, role = %user.role, "Authenticated");
        *self.write_state() = AuthSnapshot {
            status: AuthStatus::Authenticated,
            user: Some(user),
            error: None,
            session_expires_at: Some(session.expires_at),
        };
        if let Ok(mut last) = self.last_activity_write.lock() {
            *last = None;
        }
    }

    /// Store the session from a login/signup response and sign the user in.
    pub fn establish_session(&self, response: &AuthResponse) -> SessionResult<AuthUser> {
        let session = response.to_session(self.now());
        self.storage.store(&session)?;
        let user = AuthUser::from(&response.user);
        self.login(user.clone(), &session);
        Ok(user)
    }

    /// Clear the stored session and sign out locally. Always succeeds.
    pub fn logout(&self) {
        self.storage.clear();
        let previous = std::mem::replace(&mut *self.write_state(), AuthSnapshot::unauthenticated());
        if let Some(user) = previous.user {
            info!(user_id = %user.id, "Signed out");
        }
    }

    pub fn clear_error(&self) {
        self.write_state().error = None;
    }

    pub fn set_error(&self, error: AuthError) {
        self.write_state().error = Some(error);
    }

    // ========== Session Upkeep ==========

    /// Note user activity, refreshing the stored `last_activity`.
    ///
    /// Returns whether a write happened. Writes are skipped when not
    /// authenticated or when the previous write was less than the
    /// activity throttle ago.
    pub fn record_activity(&self) -> SessionResult<bool> {
        if !self.is_authenticated() {
            return Ok(false);
        }

        let now = self.now();
        let mut last = self
            .last_activity_write
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = *last {
            let throttle = chrono::Duration::from_std(self.activity_throttle)
                .unwrap_or(chrono::Duration::MAX);
            if now - previous < throttle {
                return Ok(false);
            }
        }

        self.storage.update_activity()?;
        *last = Some(now);
        Ok(true)
    }

    /// Re-check the stored session; ends the session if it is no longer valid.
    pub fn check_session(&self) -> SessionCheck {
        if !self.is_authenticated() {
            return SessionCheck::Inactive;
        }

        let now = self.now();
        match self.storage.get_stored() {
            Some(session) if session.is_valid_at(now) => {
                if session.should_refresh_at(now) {
                    SessionCheck::RefreshDue
                } else {
                    SessionCheck::Valid
                }
            }
            _ => {
                warn!("Session is no longer valid, signing out");
                self.logout();
                SessionCheck::Expired
            }
        }
    }

    /// Renew the token pair through the configured refresher.
    ///
    /// Returns `Ok(false)` when there is no refresher or no session. A
    /// rejected refresh token (`INVALID_CREDENTIALS`) signs the user out;
    /// other failures are recorded in [`error`](Self::error) and returned.
    pub async fn refresh_session(&self) -> ClientResult<bool> {
        let Some(refresher) = self.refresher.clone() else {
            return Ok(false);
        };
        let Some(session) = self.storage.get_stored() else {
            return Ok(false);
        };

        match refresher.refresh(&session.refresh_token).await {
            Ok(pair) => {
                let expires_at = pair.expires_at(self.now());
                let renewed = session.with_tokens(pair.access_token, pair.refresh_token, expires_at);
                self.storage.store(&renewed)?;
                self.write_state().session_expires_at = Some(expires_at);
                info!(user_id = %renewed.user_id, %expires_at, "Session refreshed");
                Ok(true)
            }
            Err(ClientError::Auth(error)) if error.code == AuthErrorCode::InvalidCredentials => {
                warn!(error = %error, "Refresh token rejected, signing out");
                self.logout();
                Err(ClientError::Auth(error))
            }
            Err(e) => {
                warn!(error = %e, "Session refresh failed");
                if let ClientError::Auth(error) = &e {
                    self.set_error(error.clone());
                }
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthContext")
            .field("state", &*self.read_state())
            .field("has_refresher", &self.refresher.is_some())
            .finish_non_exhaustive()
    }
}
