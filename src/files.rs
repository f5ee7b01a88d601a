//! File-browser and dashboard calls.
//!
//! Every call goes through the shared [`ApiClient`], so it carries the
//! session header and a 401 ends the session like any other policed request.
//!
//! Paths in URLs are sent as one encoded segment (`docs/a.txt` becomes
//! `docs%2Fa.txt`) relative to the user's home, see [`relative_path`].

#[cfg(test)]
#[path = "files_test.rs"]
mod files_test;

use std::sync::Arc;

use envelope::{DirectoryRequest, FileEntry, MoveRequest, SearchResult, StorageInfo, User};

use crate::error::ClientError;
use crate::net::{ApiClient, ApiRequest, FormPart};

/// Filters for `GET /search/files`. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub content_type: Option<String>,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl SearchQuery {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), ..Self::default() }
    }

    fn into_request(self) -> ApiRequest {
        let mut request = ApiRequest::get("/search/files").query("query", self.query);
        if let Some(content_type) = self.content_type {
            request = request.query("contentType", content_type);
        }
        let numbers = [
            ("minSize", self.min_size),
            ("maxSize", self.max_size),
            ("page", self.page.map(u64::from)),
            ("size", self.size.map(u64::from)),
        ];
        for (key, value) in numbers {
            if let Some(value) = value {
                request = request.query(key, value.to_string());
            }
        }
        request
    }
}

pub struct FilesApi {
    api: Arc<ApiClient>,
}

impl FilesApi {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Entries directly under `path`; `""` or `"/"` lists the home directory.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`] from the shared client.
    pub async fn list(&self, path: &str) -> Result<Vec<FileEntry>, ClientError> {
        let relative = relative_path(path);
        let request = if relative.is_empty() {
            ApiRequest::get("/directories/")
        } else {
            ApiRequest::get("/directories").segment(relative)
        };
        self.api.call(request).await
    }

    /// # Errors
    ///
    /// Any [`ClientError`] from the shared client.
    pub async fn search(&self, query: SearchQuery) -> Result<SearchResult, ClientError> {
        self.api.call(query.into_request()).await
    }

    /// # Errors
    ///
    /// Any [`ClientError`] from the shared client.
    pub async fn create_directory(&self, path: &str) -> Result<(), ClientError> {
        let body = DirectoryRequest { path: relative_path(path) };
        self.api.call_unit(ApiRequest::post("/directories").json(&body)?).await
    }

    /// Move or rename a file or directory.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`] from the shared client.
    pub async fn move_entry(&self, source: &str, destination: &str) -> Result<(), ClientError> {
        let body = MoveRequest { source_path: relative_path(source), destination_path: relative_path(destination) };
        self.api.call_unit(ApiRequest::put("/directories/move").json(&body)?).await
    }

    /// # Errors
    ///
    /// Any [`ClientError`] from the shared client.
    pub async fn delete_file(&self, path: &str) -> Result<(), ClientError> {
        self.api.call_unit(ApiRequest::delete("/files").segment(relative_path(path))).await
    }

    /// Delete a directory and everything under it.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`] from the shared client.
    pub async fn delete_directory(&self, path: &str) -> Result<(), ClientError> {
        self.api.call_unit(ApiRequest::delete("/directories").segment(relative_path(path))).await
    }

    /// Upload `bytes` as `file_name` into `target_dir` in a single
    /// multipart request. Returns the stored file's metadata.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`] from the shared client; the backend rejects
    /// uploads that would exceed the quota.
    pub async fn upload(&self, target_dir: &str, file_name: &str, bytes: Vec<u8>) -> Result<FileEntry, ClientError> {
        let target = format!("/{}", relative_path(target_dir));
        let request = ApiRequest::post("/files/upload").multipart(vec![
            FormPart::file("file", file_name, bytes),
            FormPart::text("targetDirectory", target),
        ]);
        self.api.call(request).await
    }

    /// Raw file content.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`] from the shared client.
    pub async fn download(&self, path: &str) -> Result<Vec<u8>, ClientError> {
        self.api
            .fetch_bytes(ApiRequest::get("/files/download").segment(relative_path(path)))
            .await
    }

    /// # Errors
    ///
    /// Any [`ClientError`] from the shared client.
    pub async fn info(&self, path: &str) -> Result<FileEntry, ClientError> {
        self.api.call(ApiRequest::get("/files/info").segment(relative_path(path))).await
    }

    /// # Errors
    ///
    /// Any [`ClientError`] from the shared client.
    pub async fn storage_info(&self) -> Result<StorageInfo, ClientError> {
        self.api.call(ApiRequest::get("/user/storage-info")).await
    }

    /// Fresh profile of the signed-in user, as the backend sees it.
    ///
    /// # Errors
    ///
    /// Any [`ClientError`] from the shared client.
    pub async fn profile(&self) -> Result<User, ClientError> {
        self.api.call(ApiRequest::get("/user/profile")).await
    }
}

/// Path relative to the user's home, as the file endpoints expect it.
///
/// Backslashes become `/`, leading slashes are dropped, and a stored
/// `users/<name>/` prefix is stripped: `users/alice/docs/a.txt` yields
/// `docs/a.txt`.
#[must_use]
pub fn relative_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let trimmed = normalized.trim_start_matches('/');
    let parts: Vec<&str> = trimmed.split('/').collect();
    if parts.len() >= 3 && parts[0] == "users" {
        return parts[2..].join("/");
    }
    trimmed.to_owned()
}

/// Split a remote path into `(label, path)` crumbs, root first.
///
/// `"/docs/2024/"` yields `[("/", "/"), ("docs", "/docs"), ("2024", "/docs/2024")]`.
#[must_use]
pub fn breadcrumbs(path: &str) -> Vec<(String, String)> {
    let mut crumbs = vec![("/".to_owned(), "/".to_owned())];
    let mut current = String::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        current.push('/');
        current.push_str(segment);
        crumbs.push((segment.to_owned(), current.clone()));
    }
    crumbs
}
