// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cross-cutting auth events.
//!
//! The API client publishes here instead of calling into the session layer;
//! whoever owns the session (usually a [`crate::monitor::SessionMonitor`])
//! subscribes and decides what to do.

use tokio::sync::broadcast;
use tracing::debug;

const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// The API answered 401: the current credentials are no longer accepted.
    Unauthorized,
}

/// Broadcast bus for [`AuthEvent`]s. Clones publish to the same channel.
#[derive(Debug, Clone)]
pub struct AuthEvents {
    sender: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is fine.
    pub fn publish(&self, event: AuthEvent) {
        if self.sender.send(event).is_err() {
            debug!(?event, "Auth event published with no subscribers");
        }
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}
