//! Shared REST envelope and DTOs for the storage service API.
//!
//! Every backend endpoint answers with the same JSON envelope:
//! `{ success, message, data?, error?, timestamp }`. This crate owns that
//! shape plus the payloads carried inside it, so the client library and any
//! test doubles agree on field names without duplicating serde attributes.


use std::fmt;

use serde::{Deserialize, Serialize};

/// Fallback text when a failure envelope carries neither `error` nor `message`.
pub const GENERIC_FAILURE: &str = "request failed";

// =============================================================================
// ENVELOPE
// =============================================================================

/// Uniform response envelope returned by every endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the backend considers the call successful.
    pub success: bool,
    /// Human-readable status line.
    #[serde(default)]
    pub message: String,
    /// Payload, present on success for endpoints that return data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Failure detail, present when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Server timestamp, opaque to the client.
    #[serde(default)]
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// Build a successful envelope around `data`.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self { success: true, message: message.into(), data: Some(data), error: None, timestamp: String::new() }
    }

    /// Build a failure envelope carrying `error`.
    pub fn fail(error: impl Into<String>) -> Self {
        Self { success: false, message: String::new(), data: None, error: Some(error.into()), timestamp: String::new() }
    }

    /// Message to surface when this envelope reports a failure.
    ///
    /// Prefers a non-empty `error`, then a non-empty `message`, then
    /// [`GENERIC_FAILURE`].
    #[must_use]
    pub fn failure_message(&self) -> String {
        non_empty(self.error.as_deref())
            .or_else(|| non_empty(Some(self.message.as_str())))
            .unwrap_or(GENERIC_FAILURE)
            .to_owned()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Extract a non-empty `error` string from a raw response body.
///
/// Bodies that are not JSON objects, or that lack `error`, yield `None` so the
/// caller can fall back to transport-level text.
#[must_use]
pub fn error_field(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).unwrap_or(serde_json::Value::Null);
    non_empty(value.get("error").and_then(serde_json::Value::as_str)).map(str::to_owned)
}

/// Transport-level failure text for a non-2xx status with no structured body.
#[must_use]
pub fn status_failure_message(status: u16) -> String {
    format!("request failed with status code {status}")
}

// =============================================================================
// IDENTITY
// =============================================================================

/// Account record returned by the identity endpoints.
///
/// `userId` and `username` are required; the remaining fields tolerate
/// omission so older backends still deserialize.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub last_login_at: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Root directory assigned to the account on the storage cluster.
    #[serde(default)]
    pub user_directory: String,
    /// Storage quota in bytes.
    #[serde(default)]
    pub quota_limit: u64,
    /// Bytes currently stored.
    #[serde(default)]
    pub current_usage: u64,
}

fn default_active() -> bool {
    true
}

/// `data` payload of a successful login or register call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: User,
    pub session_id: String,
}

/// Body of `POST /user/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /user/register`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn new(username: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), email: email.into(), password: password.into() }
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

// =============================================================================
// FILES
// =============================================================================

/// Metadata of one file or directory as the storage service reports it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    /// Path as stored by the backend, usually `users/<name>/...`.
    pub path: String,
    /// Older backend builds serialize this flag as `directory`.
    #[serde(default, alias = "directory")]
    pub is_directory: bool,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub upload_time: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub replication_factor: u32,
    #[serde(default)]
    pub current_replicas: u32,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Quota summary returned by `GET /user/storage-info`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub current_usage: u64,
    pub quota_limit: u64,
    /// As computed by the backend; prefer [`StorageInfo::percent_used`].
    #[serde(default)]
    pub usage_percentage: f64,
    /// Negative when the user is over quota.
    #[serde(default)]
    pub available_space: i64,
    #[serde(default)]
    pub formatted_usage: String,
    #[serde(default)]
    pub formatted_quota: String,
}

impl StorageInfo {
    /// Share of the quota in use, clamped to `0..=100`. A zero quota reads as 0%.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent_used(&self) -> f64 {
        if self.quota_limit == 0 {
            return 0.0;
        }
        let pct = self.current_usage as f64 / self.quota_limit as f64 * 100.0;
        pct.clamp(0.0, 100.0)
    }
}

/// Body of `POST /directories`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRequest {
    pub path: String,
}

/// Body of `PUT /directories/move`; moves or renames a file or directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub source_path: String,
    pub destination_path: String,
}

// =============================================================================
// SEARCH
// =============================================================================

/// One hit of `GET /search/files`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(default)]
    pub file_id: String,
    pub file_name: String,
    pub file_path: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub relevance_score: f64,
}

/// One page of search hits.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(default)]
    pub files: Vec<SearchHit>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_previous: bool,
}
