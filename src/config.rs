//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;

use reqwest::header::HeaderName;

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/api";
pub const DEFAULT_SESSION_HEADER: &str = "X-Session-ID";
pub const DEFAULT_AUTH_ROUTE: &str = "/auth";
pub const DEFAULT_STATE_FILE: &str = ".dfs-session.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash.
    pub base_url: String,
    /// Header carrying the session token on every request. Must match what
    /// the backend reads.
    pub session_header: String,
    /// Client route reported by session-invalidated events.
    pub auth_route: String,
    /// Durable storage file used by the CLI shell.
    pub state_file: PathBuf,
    pub timeouts: Timeouts,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            session_header: DEFAULT_SESSION_HEADER.to_owned(),
            auth_route: DEFAULT_AUTH_ROUTE.to_owned(),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            timeouts: Timeouts::default(),
        }
    }
}

impl ClientConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `DFS_BASE_URL`: default `http://127.0.0.1:8080/api`
    /// - `DFS_SESSION_HEADER`: default `X-Session-ID`
    /// - `DFS_AUTH_ROUTE`: default `/auth`
    /// - `DFS_STATE_FILE`: default `.dfs-session.json`
    /// - `DFS_REQUEST_TIMEOUT_SECS`: default 30
    /// - `DFS_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the header name is not a valid HTTP
    /// header name or the base URL is empty.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("DFS_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let session_header = lookup("DFS_SESSION_HEADER").unwrap_or_else(|| DEFAULT_SESSION_HEADER.to_owned());
        let auth_route = lookup("DFS_AUTH_ROUTE").unwrap_or_else(|| DEFAULT_AUTH_ROUTE.to_owned());
        let state_file = lookup("DFS_STATE_FILE").map_or_else(|| PathBuf::from(DEFAULT_STATE_FILE), PathBuf::from);
        let timeouts = Timeouts {
            request_secs: parse_secs(lookup("DFS_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_secs(lookup("DFS_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Self { base_url, session_header, auth_route, state_file, timeouts }.validated()
    }

    /// Normalize and check the values the transport depends on.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for an empty base URL or an invalid
    /// session header name.
    pub fn validated(mut self) -> Result<Self, ClientError> {
        self.base_url = self.base_url.trim().trim_end_matches('/').to_owned();
        if self.base_url.is_empty() {
            return Err(ClientError::Config("base URL is empty".to_owned()));
        }
        self.session_header = self.session_header.trim().to_owned();
        HeaderName::from_bytes(self.session_header.as_bytes())
            .map_err(|_| ClientError::Config(format!("invalid session header name '{}'", self.session_header)))?;
        // A zero timeout would fail every request before it is sent.
        if self.timeouts.request_secs == 0 {
            self.timeouts.request_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
        if self.timeouts.connect_secs == 0 {
            self.timeouts.connect_secs = DEFAULT_CONNECT_TIMEOUT_SECS;
        }
        Ok(self)
    }
}

/// Positive whole seconds; anything else falls back to `default`.
fn parse_secs(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(default)
}
