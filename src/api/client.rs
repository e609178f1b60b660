// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP client for the QubitCore auth API.
//!
//! ## Request Pipeline
//!
//! 1. Every request gets `Content-Type`/`Accept: application/json` and an
//!    `X-Request-Id`
//! 2. The bearer token is attached to paths outside `/auth/` (see
//!    [`path_attaches_bearer`]); [`BearerPolicy::PerEndpoint`] extends it to
//!    the account calls under `/auth/`
//! 3. Failures are normalised into [`AuthError`]; a 401 additionally
//!    publishes [`AuthEvent::Unauthorized`]
//! 4. Success bodies are deserialised strictly into the expected model
//!
//! Requests time out after the configured timeout (10 s by default) and
//! are never retried.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::endpoints::{path_attaches_bearer, BearerPolicy, Endpoint};
use super::events::{AuthEvent, AuthEvents};
use super::models::{
    AuthResponse, ChangePasswordRequest, DeleteAccountRequest, EmailRequest, LoginRequest,
    LogoutRequest, MessageResponse, PasswordResetConfirm, ProfileUpdate, RefreshRequest,
    SignupRequest, TokenPair, TokenRequest, User,
};
use crate::auth::{AuthError, AuthErrorCode};
use crate::config::ClientConfig;
use crate::context::SessionRefresher;
use crate::error::{ClientError, ClientResult};
use crate::session::SessionStorage;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Source of the bearer token for authenticated requests.
pub trait TokenProvider: Send + Sync {
    fn access_token(&self) -> Option<String>;
}

impl TokenProvider for SessionStorage {
    fn access_token(&self) -> Option<String> {
        SessionStorage::access_token(self)
    }
}

/// Client for the auth REST API.
#[derive(Clone)]
pub struct AuthApiClient {
    config: ClientConfig,
    http: Client,
    tokens: Option<Arc<dyn TokenProvider>>,
    bearer: BearerPolicy,
    events: AuthEvents,
}

impl AuthApiClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http,
            tokens: None,
            bearer: BearerPolicy::default(),
            events: AuthEvents::new(),
        })
    }

    /// Use `tokens` as the bearer source.
    pub fn with_token_provider(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn with_bearer_policy(mut self, bearer: BearerPolicy) -> Self {
        self.bearer = bearer;
        self
    }

    /// Publish on an existing event bus instead of a private one.
    pub fn with_events(mut self, events: AuthEvents) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn events(&self) -> &AuthEvents {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    // ========== Auth Flows ==========

    pub async fn signup(&self, request: &SignupRequest) -> ClientResult<AuthResponse> {
        let response: AuthResponse = self.send(Endpoint::Signup, Some(request)).await?;
        info!(user_id = %response.user.id, "Signed up");
        Ok(response)
    }

    pub async fn login(&self, request: &LoginRequest) -> ClientResult<AuthResponse> {
        let response: AuthResponse = self.send(Endpoint::Login, Some(request)).await?;
        info!(user_id = %response.user.id, "Logged in");
        Ok(response)
    }

    /// Tell the server to end the session.
    ///
    /// Never fails: local cleanup must proceed whether or not the server
    /// acknowledges, so errors are only logged.
    pub async fn logout(&self, refresh_token: Option<&str>) {
        let body = LogoutRequest {
            refresh_token: refresh_token.map(str::to_string),
        };
        let endpoint = Endpoint::Logout;
        match self
            .execute(endpoint.method(), endpoint.path(), self.bearer.attaches(endpoint), Some(&body))
            .await
        {
            Ok(_) => info!("Logged out"),
            Err(e) => warn!(code = %e.code, error = %e.message, "Logout request failed, ignoring"),
        }
    }

    /// Exchange a refresh token for a new token pair.
    pub async fn refresh_token(&self, refresh_token: &str) -> ClientResult<TokenPair> {
        let body = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.send(Endpoint::Refresh, Some(&body)).await
    }

    pub async fn request_password_reset(&self, email: &str) -> ClientResult<MessageResponse> {
        let body = EmailRequest {
            email: email.to_string(),
        };
        self.send(Endpoint::PasswordResetRequest, Some(&body)).await
    }

    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> ClientResult<MessageResponse> {
        let body = PasswordResetConfirm {
            token: token.to_string(),
            new_password: new_password.to_string(),
        };
        self.send(Endpoint::PasswordResetConfirm, Some(&body)).await
    }

    pub async fn verify_email(&self, token: &str) -> ClientResult<MessageResponse> {
        let body = TokenRequest {
            token: token.to_string(),
        };
        self.send(Endpoint::VerifyEmail, Some(&body)).await
    }

    pub async fn resend_verification(&self, email: &str) -> ClientResult<MessageResponse> {
        let body = EmailRequest {
            email: email.to_string(),
        };
        self.send(Endpoint::ResendVerification, Some(&body)).await
    }

    // ========== Account ==========

    /// Fetch the signed-in user's profile.
    pub async fn me(&self) -> ClientResult<User> {
        self.send(Endpoint::Me, None::<&()>).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ClientResult<User> {
        self.send(Endpoint::UpdateProfile, Some(update)).await
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> ClientResult<MessageResponse> {
        let body = ChangePasswordRequest {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        self.send(Endpoint::ChangePassword, Some(&body)).await
    }

    pub async fn delete_account(&self, password: &str) -> ClientResult<MessageResponse> {
        let body = DeleteAccountRequest {
            password: password.to_string(),
        };
        self.send(Endpoint::DeleteAccount, Some(&body)).await
    }

    // ========== Generic Requests ==========

    /// Call an arbitrary API path.
    ///
    /// The bearer token is attached unless the path is an auth flow
    /// (contains `/auth/`).
    pub async fn request<B, R>(&self, method: Method, path: &str, body: Option<&B>) -> ClientResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let bytes = self
            .execute(method.clone(), path, path_attaches_bearer(path), body)
            .await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::invalid_response(format!("{method} {path}"), e))
    }

    async fn send<B, R>(&self, endpoint: Endpoint, body: Option<&B>) -> ClientResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let bytes = self
            .execute(endpoint.method(), endpoint.path(), self.bearer.attaches(endpoint), body)
            .await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::invalid_response(endpoint, e))
    }

    /// Perform one request and return the raw success body.
    async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        attach_bearer: bool,
        body: Option<&B>,
    ) -> Result<Vec<u8>, AuthError>
    where
        B: Serialize + ?Sized,
    {
        let request_id = Uuid::new_v4().to_string();
        let url = self.config.endpoint_url(path);

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(REQUEST_ID_HEADER, &request_id);

        if attach_bearer {
            if let Some(token) = self.tokens.as_ref().and_then(|t| t.access_token()) {
                request = request.header(AUTHORIZATION, format!("Bearer {token}"));
            }
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%request_id, %method, path, "Sending API request");

        let response = request.send().await.map_err(|e| {
            warn!(%request_id, %method, path, error = %e, "API request got no response");
            no_response_error(&e)
        })?;

        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await.map_err(|e| {
                warn!(%request_id, %method, path, error = %e, "Failed to read API response body");
                no_response_error(&e)
            })?;
            debug!(%request_id, status = status.as_u16(), "API request succeeded");
            return Ok(bytes.to_vec());
        }

        let error = self.failure(status, response.bytes().await);
        warn!(
            %request_id,
            %method,
            path,
            status = status.as_u16(),
            code = %error.code,
            "API request failed"
        );
        Err(error)
    }

    /// Normalise an error response. The status alone decides the code and
    /// the 401 event; an unreadable body is treated as empty.
    fn failure<B, E>(&self, status: StatusCode, body: Result<B, E>) -> AuthError
    where
        B: AsRef<[u8]>,
        E: std::fmt::Display,
    {
        if status == StatusCode::UNAUTHORIZED {
            self.events.publish(AuthEvent::Unauthorized);
        }

        match body {
            Ok(bytes) => AuthError::from_response(status, bytes.as_ref()),
            Err(e) => {
                debug!(status = status.as_u16(), error = %e, "Failed to read API error body");
                AuthError::from_response(status, &[])
            }
        }
    }
}

fn no_response_error(e: &reqwest::Error) -> AuthError {
    let error = AuthError::new(AuthErrorCode::NetworkError);
    let error = if e.is_timeout() {
        error.with_message("Request timed out")
    } else {
        error
    };
    error.with_details(json!({ "reason": e.to_string() }))
}

impl std::fmt::Debug for AuthApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthApiClient")
            .field("api_url", &self.config.api_url())
            .field("has_token_provider", &self.tokens.is_some())
            .field("bearer", &self.bearer)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionRefresher for AuthApiClient {
    async fn refresh(&self, refresh_token: &str) -> ClientResult<TokenPair> {
        self.refresh_token(refresh_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedToken(&'static str);

    impl TokenProvider for FixedToken {
        fn access_token(&self) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    #[test]
    fn client_creation() {
        let config = ClientConfig::new("https://api.example.com/v1").unwrap();
        let client = AuthApiClient::new(config)
            .unwrap()
            .with_token_provider(Arc::new(FixedToken("t")));
        assert_eq!(client.config().api_url(), "https://api.example.com/v1");
        assert!(format!("{client:?}").contains("has_token_provider: true"));
    }

    #[test]
    fn unreadable_401_body_still_signals_unauthorized() {
        let config = ClientConfig::new("https://api.example.com/v1").unwrap();
        let client = AuthApiClient::new(config).unwrap();
        let mut events = client.subscribe();

        let error = client.failure(StatusCode::UNAUTHORIZED, Err::<Vec<u8>, _>("connection reset"));
        assert_eq!(error.code, AuthErrorCode::InvalidCredentials);
        assert_eq!(error.message, AuthErrorCode::InvalidCredentials.default_message());
        assert_eq!(events.try_recv().unwrap(), AuthEvent::Unauthorized);
    }

    #[test]
    fn readable_error_body_overrides_message() {
        let config = ClientConfig::new("https://api.example.com/v1").unwrap();
        let client = AuthApiClient::new(config).unwrap();
        let mut events = client.subscribe();

        let error = client.failure(
            StatusCode::FORBIDDEN,
            Ok::<_, &str>(br#"{"message":"Too many attempts"}"#.to_vec()),
        );
        assert_eq!(error.code, AuthErrorCode::AccountLocked);
        assert_eq!(error.message, "Too many attempts");
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let config = ClientConfig::new("http://127.0.0.1:9").unwrap();
        let client = AuthApiClient::new(config).unwrap();
        let err = client.me().await.unwrap_err();
        assert_eq!(err.auth_code(), Some(AuthErrorCode::NetworkError));
    }
}
