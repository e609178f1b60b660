// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Monitor
//!
//! Background task that keeps an [`AuthContext`] honest while a session is
//! active.
//!
//! ## Strategy
//!
//! Every `interval` (default 60 s) the monitor:
//! 1. Re-validates the stored session; an invalid session is ended.
//! 2. When the access token is inside its refresh window, asks the context
//!    to refresh it.
//!
//! Between ticks it listens for [`AuthEvent::Unauthorized`] from the API
//! client and signs the user out when one arrives.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::AuthEvent;
use crate::context::{AuthContext, SessionCheck};

/// Default interval between session checks.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

pub struct SessionMonitor {
    context: Arc<AuthContext>,
    interval: Duration,
    events: Option<broadcast::Receiver<AuthEvent>>,
}

impl SessionMonitor {
    pub fn new(context: Arc<AuthContext>) -> Self {
        Self {
            context,
            interval: DEFAULT_CHECK_INTERVAL,
            events: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// React to events from an API client's bus.
    pub fn with_events(mut self, events: broadcast::Receiver<AuthEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Run the monitor loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(monitor.run(shutdown.clone()));
    /// ```
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Session monitor starting"
        );

        let mut ticker = tokio::time::interval(self.interval);
        // The first tick completes immediately; the context was just initialised.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Session monitor shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
                event = recv_event(&mut self.events) => {
                    self.handle_event(event);
                }
            }
        }
    }

    /// Execute one validation pass.
    pub async fn tick(&self) -> SessionCheck {
        let check = self.context.check_session();
        if check == SessionCheck::RefreshDue {
            if let Err(e) = self.context.refresh_session().await {
                warn!(error = %e, "Session monitor: refresh failed");
            }
        }
        check
    }

    fn handle_event(&mut self, event: Result<AuthEvent, RecvError>) {
        match event {
            Ok(AuthEvent::Unauthorized) => {
                if self.context.is_authenticated() {
                    warn!("Session monitor: API rejected credentials, signing out");
                    self.context.logout();
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Session monitor: auth events lagged");
            }
            Err(RecvError::Closed) => {
                info!("Session monitor: auth event channel closed");
                self.events = None;
            }
        }
    }
}

/// Next event, or pending forever when there is no channel.
async fn recv_event(
    events: &mut Option<broadcast::Receiver<AuthEvent>>,
) -> Result<AuthEvent, RecvError> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::AuthEvents;
    use crate::auth::{AuthUser, Role};
    use crate::clock::{Clock, ManualClock};
    use crate::context::AuthStatus;
    use crate::session::{MemoryCookieJar, SessionData, SessionStorage};
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use chrono::DateTime;

    fn make_token(exp: i64) -> String {
        let claims = format!(
            r#"{{"sub":"user_1","email":"ada@qubitcore.com","name":"Ada","role":"visitor","exp":{exp},"iat":0}}"#
        );
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#),
            URL_SAFE_NO_PAD.encode(claims)
        )
    }

    fn authenticated_context() -> (Arc<AuthContext>, ManualClock) {
        let clock = ManualClock::new(DateTime::from_timestamp(1_800_000_000, 0).unwrap());
        let jar = Arc::new(MemoryCookieJar::with_clock(Arc::new(clock.clone())));
        let storage = SessionStorage::with_clock(jar, Arc::new(clock.clone()));
        let exp = clock.now().timestamp() + 3600;
        let user = AuthUser {
            id: "user_1".to_string(),
            email: "ada@qubitcore.com".to_string(),
            name: "Ada".to_string(),
            role: Role::Visitor,
        };
        let session = SessionData::new(
            make_token(exp),
            "refresh",
            &user,
            DateTime::from_timestamp(exp, 0).unwrap(),
            clock.now(),
        );
        storage.store(&session).unwrap();
        let context = Arc::new(AuthContext::new(storage));
        context.initialize();
        (context, clock)
    }

    #[tokio::test]
    async fn tick_ends_expired_session() {
        let (context, clock) = authenticated_context();
        let monitor = SessionMonitor::new(context.clone());

        assert_eq!(monitor.tick().await, SessionCheck::Valid);
        clock.advance(chrono::Duration::seconds(3601));
        assert_eq!(monitor.tick().await, SessionCheck::Expired);
        assert_eq!(context.status(), AuthStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn unauthorized_event_signs_out() {
        let (context, _clock) = authenticated_context();
        let events = AuthEvents::new();
        let monitor = SessionMonitor::new(context.clone())
            .with_interval(Duration::from_secs(3600))
            .with_events(events.subscribe());

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(monitor.run(shutdown.clone()));

        events.publish(AuthEvent::Unauthorized);
        for _ in 0..100 {
            if !context.is_authenticated() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!context.is_authenticated());

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let (context, _clock) = authenticated_context();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(SessionMonitor::new(context).run(shutdown.clone()));
        shutdown.cancel();
        handle.await.unwrap();
    }
}
