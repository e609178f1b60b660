// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access-token claim inspection.
//!
//! These helpers only *read* a token. They never verify its signature, so a
//! decoded payload says nothing about authenticity; it is only used to drive
//! client-side expiry bookkeeping.
//!
//! Every time-dependent helper has an `_at` variant taking an explicit
//! instant, which is what the session layer uses with its injected clock.

use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};

use super::claims::JwtPayload;

/// Refresh is signalled once less than this much lifetime remains.
pub const REFRESH_THRESHOLD: Duration = Duration::from_secs(5 * 60);

/// Decode the payload segment of a JWT.
///
/// Returns `None` for anything that is not three dot-separated segments
/// whose middle segment is base64url-encoded JSON matching [`JwtPayload`].
/// `None` means "unusable", never "valid but empty".
pub fn decode(token: &str) -> Option<JwtPayload> {
    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let payload = payload.trim_end_matches('=');
    if payload.is_empty() {
        return None;
    }

    let bytes = Base64UrlUnpadded::decode_vec(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Whether the token is expired (or undecodable) right now.
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now())
}

/// Whether the token is expired (or undecodable) at `now`.
pub fn is_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    match decode(token) {
        Some(payload) => payload.exp <= now.timestamp(),
        None => true,
    }
}

/// Whether the token should be renewed right now.
pub fn should_refresh(token: &str) -> bool {
    should_refresh_at(token, Utc::now())
}

/// Whether less than [`REFRESH_THRESHOLD`] remains before expiry at `now`.
///
/// Undecodable tokens always need refreshing.
pub fn should_refresh_at(token: &str, now: DateTime<Utc>) -> bool {
    match decode(token) {
        Some(payload) => remaining_ms(payload.exp, now) < REFRESH_THRESHOLD.as_millis() as i64,
        None => true,
    }
}

/// Remaining lifetime of the token right now; zero if expired or undecodable.
pub fn time_until_expiration(token: &str) -> Duration {
    time_until_expiration_at(token, Utc::now())
}

pub fn time_until_expiration_at(token: &str, now: DateTime<Utc>) -> Duration {
    let Some(payload) = decode(token) else {
        return Duration::ZERO;
    };
    u64::try_from(remaining_ms(payload.exp, now))
        .map(Duration::from_millis)
        .unwrap_or(Duration::ZERO)
}

/// Milliseconds from `now` until `exp`, clamped at the `i64` range.
fn remaining_ms(exp: i64, now: DateTime<Utc>) -> i64 {
    exp.saturating_mul(1000).saturating_sub(now.timestamp_millis())
}

/// Expiry instant embedded in the token, if it decodes.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    decode(token).and_then(|payload| DateTime::from_timestamp(payload.exp, 0))
}
