// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use qubitcore_auth::api::{BearerPolicy, LoginRequest, SignupRequest};
use qubitcore_auth::auth::jwt;
use qubitcore_auth::config::{ClientConfig, ConfigError, Environment, API_URL_ENV, COOKIE_FILE_ENV};
use qubitcore_auth::logging::{self, LogFormat};
use qubitcore_auth::session::{FileCookieJar, SessionError, SessionStorage};
use qubitcore_auth::{
    AuthApiClient, AuthContext, AuthUser, ClientError, InitOutcome, SessionMonitor,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("session storage error: {0}")]
    Session(#[from] SessionError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("not signed in; run `qubitcore-auth login` first")]
    NotSignedIn,
    #[error("token is not a decodable JWT")]
    InvalidToken,
    #[error("failed to wait for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "qubitcore-auth", about = "QubitCore session and auth CLI")]
struct Cli {
    #[arg(long, env = API_URL_ENV)]
    api_url: Option<String>,

    #[arg(long, env = COOKIE_FILE_ENV)]
    cookie_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the stored session state
    Status,
    /// Sign in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "QUBITCORE_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        remember_me: bool,
    },
    /// Create an account and store the session
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        company: Option<String>,
        #[arg(long, env = "QUBITCORE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the session on the server and locally
    Logout,
    /// Fetch the signed-in profile from the server
    Whoami,
    /// Exchange the refresh token for a new token pair
    Refresh,
    /// Print the claims and expiry of a token without verifying it
    Decode { token: String },
    /// Keep the session checked until interrupted
    Watch {
        #[arg(long, default_value_t = 60)]
        interval_secs: u64,
    },
}

struct Runtime {
    client: AuthApiClient,
    context: Arc<AuthContext>,
}

impl Runtime {
    fn new(config: ClientConfig) -> Result<Self, CliError> {
        let jar = Arc::new(FileCookieJar::new(config.cookie_file.clone()));
        let storage = SessionStorage::new(jar).with_secure_cookies(config.secure_cookies());
        // The CLI talks to account endpoints under /auth/, which need the bearer.
        let client = AuthApiClient::new(config)?
            .with_token_provider(Arc::new(storage.clone()))
            .with_bearer_policy(BearerPolicy::PerEndpoint);
        let context = Arc::new(AuthContext::new(storage).with_refresher(Arc::new(client.clone())));
        Ok(Self { client, context })
    }

    /// Note activity after a command that used the session.
    fn touch(&self) {
        match self.context.record_activity() {
            Ok(true) => debug!("Session activity recorded"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Failed to record session activity"),
        }
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        let environment: Environment = config.environment;
        let cookie_file = config.cookie_file.clone();
        config = ClientConfig::new(url)?
            .with_environment(environment)
            .with_cookie_file(cookie_file);
    }
    if let Some(path) = &cli.cookie_file {
        config = config.with_cookie_file(path.clone());
    }
    Ok(config)
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    if let Command::Decode { token } = &cli.command {
        return decode(token);
    }

    let config = load_config(&cli)?;
    let rt = Runtime::new(config)?;
    let outcome = rt.context.initialize();

    match cli.command {
        Command::Status => {
            let snapshot = rt.context.snapshot();
            let remaining = rt
                .context
                .storage()
                .access_token()
                .map(|t| jwt::time_until_expiration(&t).as_secs());
            print_json(&json!({
                "status": format!("{:?}", snapshot.status),
                "user": snapshot.user,
                "sessionExpiresAt": snapshot.session_expires_at,
                "needsRefresh": matches!(outcome, InitOutcome::Restored { needs_refresh: true }),
                "tokenSecondsRemaining": remaining,
            }));
            rt.touch();
        }
        Command::Login {
            email,
            password,
            remember_me,
        } => {
            let response = rt
                .client
                .login(&LoginRequest {
                    email,
                    password,
                    remember_me,
                })
                .await?;
            let user = rt.context.establish_session(&response)?;
            print_json(&json!({ "user": user }));
        }
        Command::Signup {
            email,
            name,
            company,
            password,
        } => {
            let response = rt
                .client
                .signup(&SignupRequest {
                    email,
                    password,
                    name,
                    company,
                    role: None,
                })
                .await?;
            let user = rt.context.establish_session(&response)?;
            print_json(&json!({ "user": user }));
        }
        Command::Logout => {
            let refresh_token = rt.context.storage().refresh_token();
            rt.client.logout(refresh_token.as_deref()).await;
            rt.context.logout();
            print_json(&json!({ "status": "signed out" }));
        }
        Command::Whoami => {
            if !rt.context.is_authenticated() {
                return Err(CliError::NotSignedIn);
            }
            let user = rt.client.me().await?;
            rt.touch();
            print_json(&json!({ "user": user }));
        }
        Command::Refresh => {
            if !rt.context.is_authenticated() {
                return Err(CliError::NotSignedIn);
            }
            let refreshed = rt.context.refresh_session().await?;
            rt.touch();
            print_json(&json!({
                "refreshed": refreshed,
                "sessionExpiresAt": rt.context.snapshot().session_expires_at,
            }));
        }
        Command::Watch { interval_secs } => {
            if !rt.context.is_authenticated() {
                return Err(CliError::NotSignedIn);
            }
            let shutdown = CancellationToken::new();
            let monitor = SessionMonitor::new(rt.context.clone())
                .with_interval(Duration::from_secs(interval_secs.max(1)))
                .with_events(rt.client.subscribe());
            let handle = tokio::spawn(monitor.run(shutdown.clone()));

            tokio::signal::ctrl_c().await?;
            info!("Interrupt received, stopping session monitor");
            stop_monitor(shutdown, handle).await;
        }
        Command::Decode { .. } => {}
    }

    Ok(())
}

/// Cancel the monitor and wait for it. Returns whether it exited cleanly.
async fn stop_monitor(shutdown: CancellationToken, handle: JoinHandle<()>) -> bool {
    shutdown.cancel();
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Session monitor task ended abnormally");
            false
        }
    }
}

fn decode(token: &str) -> Result<(), CliError> {
    let payload = jwt::decode(token).ok_or(CliError::InvalidToken)?;
    let header = jsonwebtoken::decode_header(token).ok();
    print_json(&json!({
        "header": header.map(|h| json!({ "alg": format!("{:?}", h.alg), "kid": h.kid, "typ": h.typ })),
        "user": AuthUser::from_payload(&payload),
        "claims": payload,
        "expired": jwt::is_expired(token),
        "shouldRefresh": jwt::should_refresh(token),
        "secondsRemaining": jwt::time_until_expiration(token).as_secs(),
    }));
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init(LogFormat::from_env());

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
