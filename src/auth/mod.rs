// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Primitives
//!
//! Token claims, roles and the normalised error taxonomy shared by the
//! session layer, the API client and the auth context.
//!
//! ## Token Handling
//!
//! 1. The API issues an access token (JWT) and a refresh token on login
//! 2. The client stores both in cookies (see `session`)
//! 3. The client reads the access token's claims to decide:
//!    - whether the session is still usable (`exp` in the future)
//!    - whether it should be renewed (< 5 minutes left)
//!
//! ## Security
//!
//! - Signatures are NOT verified here; the API remains the only authority
//! - Decoded claims are used for expiry bookkeeping and display only

pub mod claims;
pub mod error;
pub mod jwt;
pub mod roles;

pub use claims::{AuthUser, JwtPayload};
pub use error::{AuthError, AuthErrorCode};
pub use roles::Role;
