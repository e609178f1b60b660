// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{SessionError, SessionResult};
use crate::auth::{jwt, AuthUser, Role};

/// The client-held session: tokens plus user metadata and expiry bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

/// The metadata cookie: everything except the raw tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl SessionData {
    /// Start a session for `user`, active as of `now`.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        user: &AuthUser,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            user_id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            expires_at,
            last_activity: now,
        }
    }

    /// Reassemble a session from its three cookies.
    pub fn from_parts(
        access_token: String,
        refresh_token: String,
        metadata: SessionMetadata,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            user_id: metadata.user_id,
            email: metadata.email,
            name: metadata.name,
            role: metadata.role,
            expires_at: metadata.expires_at,
            last_activity: metadata.last_activity,
        }
    }

    pub fn metadata(&self) -> SessionMetadata {
        SessionMetadata {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
            expires_at: self.expires_at,
            last_activity: self.last_activity,
        }
    }

    /// The user this session belongs to.
    pub fn user(&self) -> AuthUser {
        AuthUser {
            id: self.user_id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }

    /// Replace the token pair after a refresh.
    pub fn with_tokens(
        mut self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        self.access_token = access_token.into();
        self.refresh_token = refresh_token.into();
        self.expires_at = expires_at;
        self
    }

    /// Usable at `now`: the access token is unexpired and the session has
    /// not passed `expires_at`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !jwt::is_expired_at(&self.access_token, now) && now < self.expires_at
    }

    /// The access token is within its refresh window at `now`.
    pub fn should_refresh_at(&self, now: DateTime<Utc>) -> bool {
        jwt::should_refresh_at(&self.access_token, now)
    }

    /// Whether the access token's subject is this session's user.
    pub fn token_matches_user(&self) -> bool {
        jwt::decode(&self.access_token).is_some_and(|claims| claims.sub == self.user_id)
    }

    /// Structural validation applied whenever a session is read back.
    pub fn validate(&self) -> SessionResult<()> {
        if self.access_token.trim().is_empty() {
            return Err(SessionError::Invalid("access token is empty".to_string()));
        }
        if self.refresh_token.trim().is_empty() {
            return Err(SessionError::Invalid("refresh token is empty".to_string()));
        }
        if self.user_id.trim().is_empty() {
            return Err(SessionError::Invalid("user id is empty".to_string()));
        }
        if !is_plausible_email(&self.email) {
            return Err(SessionError::Invalid(format!(
                "email {:?} is not valid",
                self.email
            )));
        }
        if self.name.trim().is_empty() {
            return Err(SessionError::Invalid("name is empty".to_string()));
        }
        Ok(())
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> SessionData {
        let now = Utc::now();
        let user = AuthUser {
            id: "user_1".to_string(),
            email: "ada@qubitcore.com".to_string(),
            name: "Ada".to_string(),
            role: Role::Developer,
        };
        SessionData::new("access", "refresh", &user, now + Duration::hours(1), now)
    }

    #[test]
    fn metadata_round_trips_through_parts() {
        let session = sample();
        let rebuilt = SessionData::from_parts(
            session.access_token.clone(),
            session.refresh_token.clone(),
            session.metadata(),
        );
        assert_eq!(rebuilt, session);
    }

    #[test]
    fn metadata_json_excludes_tokens() {
        let json = serde_json::to_value(sample().metadata()).unwrap();
        assert!(json.get("accessToken").is_none());
        assert!(json.get("refreshToken").is_none());
        assert_eq!(json["userId"], "user_1");
        assert_eq!(json["role"], "developer");
    }

    #[test]
    fn validate_accepts_sample() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_fields() {
        let mut s = sample();
        s.access_token = String::new();
        assert!(s.validate().is_err());

        let mut s = sample();
        s.email = "not-an-email".to_string();
        assert!(s.validate().is_err());

        let mut s = sample();
        s.user_id = "  ".to_string();
        assert!(s.validate().is_err());
    }

    #[test]
    fn opaque_tokens_are_never_valid() {
        let s = sample();
        assert!(!s.is_valid_at(Utc::now()));
        assert!(s.should_refresh_at(Utc::now()));
        assert!(!s.token_matches_user());
    }

    #[test]
    fn with_tokens_replaces_pair() {
        let later = Utc::now() + Duration::hours(2);
        let s = sample().with_tokens("a2", "r2", later);
        assert_eq!(s.access_token, "a2");
        assert_eq!(s.refresh_token, "r2");
        assert_eq!(s.expires_at, later);
        assert_eq!(s.user_id, "user_1");
    }
}
