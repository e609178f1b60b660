// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! QubitCore Auth - client-side session and token lifecycle
//!
//! This crate keeps a client signed in to the QubitCore API: it stores the
//! session in cookies, reads expiry from the access token, talks to the auth
//! endpoints and tracks the resulting sign-in state.
//!
//! ## Modules
//!
//! - `auth` - Token claims, roles and the auth error taxonomy
//! - `session` - Cookie jars and the session store
//! - `api` - HTTP client for the auth endpoints
//! - `context` - Sign-in state machine
//! - `monitor` - Periodic session validation and 401 handling
//!
//! ## Example
//!
//! ```rust,ignore
//! let config = ClientConfig::from_env()?;
//! let storage = SessionStorage::new(Arc::new(MemoryCookieJar::new()))
//!     .with_secure_cookies(config.secure_cookies());
//! let client = AuthApiClient::new(config)?.with_token_provider(Arc::new(storage.clone()));
//! let context = Arc::new(AuthContext::new(storage).with_refresher(Arc::new(client.clone())));
//!
//! let response = client.login(&LoginRequest { email, password, remember_me: false }).await?;
//! context.establish_session(&response)?;
//!
//! let shutdown = CancellationToken::new();
//! tokio::spawn(
//!     SessionMonitor::new(context.clone())
//!         .with_events(client.subscribe())
//!         .run(shutdown.clone()),
//! );
//! ```

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod session;

pub use api::{AuthApiClient, AuthEvent, AuthEvents};
pub use auth::{AuthError, AuthErrorCode, AuthUser, JwtPayload, Role};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ClientConfig;
pub use context::{AuthContext, AuthStatus, InitOutcome, SessionCheck, SessionRefresher};
pub use error::{ClientError, ClientResult};
pub use monitor::SessionMonitor;
pub use session::{FileCookieJar, MemoryCookieJar, SessionData, SessionStorage};
