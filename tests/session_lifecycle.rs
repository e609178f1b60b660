// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session lifecycle on a controlled clock and across process restarts.

mod common;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use qubitcore_auth::session::{FileCookieJar, MemoryCookieJar, SessionStorage};
use qubitcore_auth::{
    AuthContext, AuthStatus, AuthUser, Clock, InitOutcome, ManualClock, Role, SessionCheck,
    SessionData, SessionMonitor,
};

fn user() -> AuthUser {
    AuthUser {
        id: common::USER_ID.to_string(),
        email: common::EMAIL.to_string(),
        name: common::NAME.to_string(),
        role: Role::Developer,
    }
}

fn session_expiring_at(exp: i64, now: DateTime<Utc>) -> SessionData {
    SessionData::new(
        common::make_token(common::USER_ID, "developer", exp),
        "refresh-token-1",
        &user(),
        DateTime::from_timestamp(exp, 0).unwrap(),
        now,
    )
}

#[tokio::test]
async fn expiry_walkthrough_on_manual_clock() {
    let clock = ManualClock::new(DateTime::from_timestamp(1_900_000_000, 0).unwrap());
    let jar = Arc::new(MemoryCookieJar::with_clock(Arc::new(clock.clone())));
    let storage = SessionStorage::with_clock(jar, Arc::new(clock.clone()));

    let exp = clock.now().timestamp() + 3600;
    storage.store(&session_expiring_at(exp, clock.now())).unwrap();

    let context = Arc::new(AuthContext::new(storage.clone()));
    assert_eq!(
        context.initialize(),
        InitOutcome::Restored {
            needs_refresh: false
        }
    );
    assert!(storage.is_valid());
    assert!(!storage.should_refresh());
    assert_eq!(context.check_session(), SessionCheck::Valid);

    // Inside the five-minute refresh window.
    clock.set(DateTime::from_timestamp(exp - 200, 0).unwrap());
    assert!(storage.is_valid());
    assert!(storage.should_refresh());
    assert_eq!(context.check_session(), SessionCheck::RefreshDue);
    assert!(context.is_authenticated());

    // Past expiry.
    clock.set(DateTime::from_timestamp(exp + 1, 0).unwrap());
    assert!(!storage.is_valid());
    let monitor = SessionMonitor::new(context.clone());
    assert_eq!(monitor.tick().await, SessionCheck::Expired);
    assert_eq!(context.status(), AuthStatus::Unauthenticated);
    assert!(context.user().is_none());
    assert!(storage.get_stored().is_none());
    assert!(storage.access_token().is_none());
}

#[test]
fn activity_updates_are_throttled() {
    let clock = ManualClock::new(DateTime::from_timestamp(1_900_000_000, 0).unwrap());
    let jar = Arc::new(MemoryCookieJar::with_clock(Arc::new(clock.clone())));
    let storage = SessionStorage::with_clock(jar, Arc::new(clock.clone()));
    let exp = clock.now().timestamp() + 3600;
    storage.store(&session_expiring_at(exp, clock.now())).unwrap();

    let context = AuthContext::new(storage.clone());
    context.initialize();

    clock.advance(Duration::seconds(30));
    assert!(context.record_activity().unwrap());
    assert_eq!(storage.get_stored().unwrap().last_activity, clock.now());

    clock.advance(Duration::seconds(2));
    assert!(!context.record_activity().unwrap());

    clock.advance(Duration::seconds(10));
    assert!(context.record_activity().unwrap());
    assert_eq!(storage.get_stored().unwrap().last_activity, clock.now());
}

#[test]
fn file_jar_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let cookie_file = dir.path().join("nested").join("cookies.json");
    let now = Utc::now();
    let exp = now.timestamp() + 3600;

    {
        let storage = SessionStorage::new(Arc::new(FileCookieJar::new(&cookie_file)));
        storage.store(&session_expiring_at(exp, now)).unwrap();
    }
    assert!(cookie_file.exists());

    let storage = SessionStorage::new(Arc::new(FileCookieJar::new(&cookie_file)));
    let context = AuthContext::new(storage.clone());
    assert!(matches!(context.initialize(), InitOutcome::Restored { .. }));
    assert_eq!(context.user(), Some(user()));
    assert_eq!(
        context.snapshot().session_expires_at,
        DateTime::from_timestamp(exp, 0)
    );

    context.logout();

    let reopened = SessionStorage::new(Arc::new(FileCookieJar::new(&cookie_file)));
    assert!(reopened.get_stored().is_none());
    assert!(reopened.refresh_token().is_none());
}

#[test]
fn corrupt_cookie_file_starts_signed_out() {
    let dir = tempfile::tempdir().unwrap();
    let cookie_file = dir.path().join("cookies.json");
    std::fs::write(&cookie_file, "{ not json").unwrap();

    let storage = SessionStorage::new(Arc::new(FileCookieJar::new(&cookie_file)));
    let context = AuthContext::new(storage);
    assert_eq!(context.initialize(), InitOutcome::Cleared);
    assert_eq!(context.status(), AuthStatus::Unauthenticated);
}

#[test]
fn token_for_another_user_is_not_restored() {
    let now = Utc::now();
    let exp = now.timestamp() + 3600;
    let storage = SessionStorage::new(Arc::new(MemoryCookieJar::new()));
    let session = SessionData::new(
        common::make_token("usr_intruder", "admin", exp),
        "refresh-token-1",
        &user(),
        DateTime::from_timestamp(exp, 0).unwrap(),
        now,
    );
    storage.store(&session).unwrap();

    let context = AuthContext::new(storage.clone());
    assert_eq!(context.initialize(), InitOutcome::Cleared);
    assert!(storage.get_stored().is_none());
}
