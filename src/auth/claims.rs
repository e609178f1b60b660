// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claims and the authenticated user representation.

use serde::{Deserialize, Serialize};

use super::roles::Role;

/// Claims carried in a QubitCore access token.
///
/// All six claims are required; a payload missing any of them, or carrying
/// an unknown role, does not decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtPayload {
    /// Subject (user ID)
    pub sub: String,

    pub email: String,

    pub name: String,

    pub role: Role,

    /// Expiration timestamp (unix seconds)
    pub exp: i64,

    /// Issued at timestamp (unix seconds)
    pub iat: i64,
}

/// The signed-in user as seen by the auth context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Canonical user ID (`sub` claim)
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl AuthUser {
    /// Create from token claims.
    pub fn from_payload(payload: &JwtPayload) -> Self {
        Self {
            id: payload.sub.clone(),
            email: payload.email.clone(),
            name: payload.name.clone(),
            role: payload.role,
        }
    }
}
