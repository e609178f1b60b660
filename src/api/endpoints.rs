// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! REST endpoints consumed by the client.

use reqwest::Method;

/// Every auth endpoint the client calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Signup,
    Login,
    Logout,
    Refresh,
    PasswordResetRequest,
    PasswordResetConfirm,
    VerifyEmail,
    ResendVerification,
    Me,
    UpdateProfile,
    ChangePassword,
    DeleteAccount,
}

impl Endpoint {
    pub fn method(&self) -> Method {
        match self {
            Endpoint::Me => Method::GET,
            Endpoint::UpdateProfile | Endpoint::ChangePassword => Method::PUT,
            Endpoint::DeleteAccount => Method::DELETE,
            _ => Method::POST,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Signup => "/auth/signup",
            Endpoint::Login => "/auth/login",
            Endpoint::Logout => "/auth/logout",
            Endpoint::Refresh => "/auth/refresh",
            Endpoint::PasswordResetRequest => "/auth/password-reset/request",
            Endpoint::PasswordResetConfirm => "/auth/password-reset/confirm",
            Endpoint::VerifyEmail => "/auth/verify-email",
            Endpoint::ResendVerification => "/auth/verify-email/resend",
            Endpoint::Me => "/auth/me",
            Endpoint::UpdateProfile => "/auth/profile",
            Endpoint::ChangePassword => "/auth/password",
            Endpoint::DeleteAccount => "/auth/account",
        }
    }

    /// Whether this endpoint acts on the signed-in account.
    ///
    /// Only consulted under [`BearerPolicy::PerEndpoint`]. The pre-login
    /// flows never carry the bearer; calls acting on the account do.
    pub fn attaches_bearer(&self) -> bool {
        match self {
            Endpoint::Signup
            | Endpoint::Login
            | Endpoint::Refresh
            | Endpoint::PasswordResetRequest
            | Endpoint::PasswordResetConfirm
            | Endpoint::VerifyEmail
            | Endpoint::ResendVerification => false,
            Endpoint::Logout
            | Endpoint::Me
            | Endpoint::UpdateProfile
            | Endpoint::ChangePassword
            | Endpoint::DeleteAccount => true,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

/// Default bearer rule: attach to every path outside `/auth/`.
pub fn path_attaches_bearer(path: &str) -> bool {
    !path.contains("/auth/")
}

/// How the client decides whether a typed endpoint carries the bearer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BearerPolicy {
    /// [`path_attaches_bearer`] on the endpoint path. No `/auth/*` call
    /// carries the token.
    #[default]
    PathRule,
    /// [`Endpoint::attaches_bearer`]: account calls under `/auth/` (me,
    /// logout, profile, password, account) carry it as well.
    PerEndpoint,
}

impl BearerPolicy {
    pub fn attaches(&self, endpoint: Endpoint) -> bool {
        match self {
            BearerPolicy::PathRule => path_attaches_bearer(endpoint.path()),
            BearerPolicy::PerEndpoint => endpoint.attaches_bearer(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methods_and_paths() {
        assert_eq!(Endpoint::Me.method(), Method::GET);
        assert_eq!(Endpoint::UpdateProfile.method(), Method::PUT);
        assert_eq!(Endpoint::DeleteAccount.method(), Method::DELETE);
        assert_eq!(Endpoint::Login.method(), Method::POST);
        assert_eq!(
            Endpoint::ResendVerification.path(),
            "/auth/verify-email/resend"
        );
        assert_eq!(Endpoint::Me.to_string(), "GET /auth/me");
    }

    #[test]
    fn auth_flows_skip_bearer() {
        assert!(!Endpoint::Login.attaches_bearer());
        assert!(!Endpoint::Signup.attaches_bearer());
        assert!(!Endpoint::Refresh.attaches_bearer());
        assert!(Endpoint::Me.attaches_bearer());
        assert!(Endpoint::Logout.attaches_bearer());
    }

    #[test]
    fn default_policy_never_sends_bearer_to_auth_paths() {
        let policy = BearerPolicy::default();
        assert_eq!(policy, BearerPolicy::PathRule);
        assert!(!policy.attaches(Endpoint::Me));
        assert!(!policy.attaches(Endpoint::Logout));
        assert!(!policy.attaches(Endpoint::DeleteAccount));
        assert!(!policy.attaches(Endpoint::Login));
    }

    #[test]
    fn per_endpoint_policy_sends_bearer_to_account_calls() {
        let policy = BearerPolicy::PerEndpoint;
        assert!(policy.attaches(Endpoint::Me));
        assert!(policy.attaches(Endpoint::UpdateProfile));
        assert!(!policy.attaches(Endpoint::Refresh));
    }

    #[test]
    fn generic_paths_follow_auth_prefix_rule() {
        assert!(path_attaches_bearer("/products/shield"));
        assert!(!path_attaches_bearer("/auth/login"));
    }
}
