// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cookie jars backing the session store.
//!
//! The browser's `document.cookie` becomes the [`CookieJar`] trait. Two
//! implementations are provided:
//!
//! - [`MemoryCookieJar`] - process-local, the equivalent of one browser tab
//! - [`FileCookieJar`] - a JSON document on disk, used by the CLI so a
//!   session survives between invocations
//!
//! Both honour `max_age` against an injected [`Clock`]; a cookie past its
//! expiry reads as absent.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::{SessionError, SessionResult};
use crate::clock::{Clock, SystemClock};

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// Attributes applied when writing a cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub max_age: Option<Duration>,
    pub path: String,
    pub secure: bool,
    pub same_site: SameSite,
    pub http_only: bool,
}

impl CookieOptions {
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            max_age: Some(max_age),
            ..Self::default()
        }
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            max_age: None,
            path: "/".to_string(),
            secure: false,
            same_site: SameSite::Strict,
            http_only: false,
        }
    }
}

/// A stored cookie with its resolved expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub value: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub path: String,
    pub secure: bool,
    pub same_site: SameSite,
    pub http_only: bool,
}

impl StoredCookie {
    fn new(value: &str, options: &CookieOptions, now: DateTime<Utc>) -> Self {
        let expires_at = options
            .max_age
            .and_then(|age| chrono::Duration::from_std(age).ok())
            .map(|age| now + age);
        Self {
            value: value.to_string(),
            expires_at,
            path: options.path.clone(),
            secure: options.secure,
            same_site: options.same_site,
            http_only: options.http_only,
        }
    }

    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Minimal cookie storage used by the session layer.
pub trait CookieJar: Send + Sync {
    /// Read a live cookie value.
    fn get(&self, name: &str) -> Option<String>;

    /// Write a cookie, replacing any previous value.
    fn set(&self, name: &str, value: &str, options: &CookieOptions) -> SessionResult<()>;

    /// Delete a cookie. Deleting a missing cookie is not an error.
    fn remove(&self, name: &str) -> SessionResult<()>;
}

/// In-process cookie jar.
pub struct MemoryCookieJar {
    cookies: Mutex<HashMap<String, StoredCookie>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            cookies: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Inspect a stored cookie including its attributes.
    pub fn cookie(&self, name: &str) -> Option<StoredCookie> {
        let now = self.clock.now();
        let cookies = self.cookies.lock().ok()?;
        cookies.get(name).filter(|c| c.is_live(now)).cloned()
    }
}

impl Default for MemoryCookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        self.cookie(name).map(|c| c.value)
    }

    fn set(&self, name: &str, value: &str, options: &CookieOptions) -> SessionResult<()> {
        let cookie = StoredCookie::new(value, options, self.clock.now());
        let mut cookies = self.cookies.lock().map_err(|_| SessionError::Poisoned)?;
        cookies.insert(name.to_string(), cookie);
        Ok(())
    }

    fn remove(&self, name: &str) -> SessionResult<()> {
        let mut cookies = self.cookies.lock().map_err(|_| SessionError::Poisoned)?;
        cookies.remove(name);
        Ok(())
    }
}

/// Cookie jar persisted as a JSON file.
///
/// Every write rewrites the whole document via a temp file and rename, so a
/// crash mid-write leaves either the old or the new jar on disk.
pub struct FileCookieJar {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl FileCookieJar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, Arc::new(SystemClock))
    }

    pub fn with_clock(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the jar. Missing files are empty; unreadable files are logged
    /// and treated as empty.
    fn load(&self) -> HashMap<String, StoredCookie> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to open cookie jar");
                return HashMap::new();
            }
        };

        match serde_json::from_reader(BufReader::new(file)) {
            Ok(cookies) => cookies,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cookie jar is corrupt, ignoring it");
                HashMap::new()
            }
        }
    }

    fn save(&self, cookies: &HashMap<String, StoredCookie>) -> SessionResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, cookies)?;
            writer.flush()?;
        }

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl CookieJar for FileCookieJar {
    fn get(&self, name: &str) -> Option<String> {
        let _guard = self.lock.lock().ok()?;
        let now = self.clock.now();
        self.load()
            .remove(name)
            .filter(|c| c.is_live(now))
            .map(|c| c.value)
    }

    fn set(&self, name: &str, value: &str, options: &CookieOptions) -> SessionResult<()> {
        let _guard = self.lock.lock().map_err(|_| SessionError::Poisoned)?;
        let now = self.clock.now();
        let mut cookies = self.load();
        cookies.retain(|_, c| c.is_live(now));
        cookies.insert(name.to_string(), StoredCookie::new(value, options, now));
        self.save(&cookies)
    }

    fn remove(&self, name: &str) -> SessionResult<()> {
        let _guard = self.lock.lock().map_err(|_| SessionError::Poisoned)?;
        let mut cookies = self.load();
        if cookies.remove(name).is_some() {
            self.save(&cookies)?;
        }
        Ok(())
    }
}
