// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Auth API Client
//!
//! Typed access to the QubitCore auth endpoints:
//!
//! | Method | Path |
//! |--------|------|
//! | POST | `/auth/signup`, `/auth/login`, `/auth/logout`, `/auth/refresh` |
//! | POST | `/auth/password-reset/request`, `/auth/password-reset/confirm` |
//! | POST | `/auth/verify-email`, `/auth/verify-email/resend` |
//! | GET | `/auth/me` |
//! | PUT | `/auth/profile`, `/auth/password` |
//! | DELETE | `/auth/account` |

pub mod client;
pub mod endpoints;
pub mod events;
pub mod models;

pub use client::{AuthApiClient, TokenProvider};
pub use endpoints::{BearerPolicy, Endpoint};
pub use events::{AuthEvent, AuthEvents};
pub use models::{
    AuthResponse, LoginRequest, MessageResponse, ProfileUpdate, SignupRequest, TokenPair, User,
};
