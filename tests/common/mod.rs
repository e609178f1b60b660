// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::{json, Value};

pub const USER_ID: &str = "usr_42";
pub const EMAIL: &str = "ada@qubitcore.com";
pub const NAME: &str = "Ada Lovelace";

/// Unsigned JWT carrying the standard claim set.
pub fn make_token(sub: &str, role: &str, exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = json!({
        "sub": sub,
        "email": EMAIL,
        "name": NAME,
        "role": role,
        "exp": exp,
        "iat": exp - 3600,
    });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

pub fn user_json() -> Value {
    json!({
        "id": USER_ID,
        "email": EMAIL,
        "name": NAME,
        "role": "developer",
        "emailVerified": true,
        "createdAt": "2026-01-01T00:00:00Z"
    })
}

/// A login/signup success body whose access token expires at `exp`.
pub fn auth_response_json(exp: i64) -> Value {
    json!({
        "user": user_json(),
        "tokens": {
            "accessToken": make_token(USER_ID, "developer", exp),
            "refreshToken": "refresh-token-1",
            "expiresIn": 3600
        }
    })
}
