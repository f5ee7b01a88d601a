//! Shared API client: session header attachment and 401 policing.
//!
//! ARCHITECTURE
//! ============
//! Every backend call goes through [`ApiClient::send`]. On the way out it
//! reads the persisted token and attaches it under the configured header; on
//! the way back it inspects the status. A 401 on a policed request purges the
//! durable record (only if it still holds the token that request carried) and
//! emits a session-invalidated event.
//!
//! Auth exchanges are sent with [`Policing::Exempt`]: a 401 from
//! `/user/login` means bad credentials, not an expired session.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::sync::Arc;

use envelope::ApiResponse;
use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::events::SessionEvents;
use super::transport::{FormPart, HttpRequest, HttpResponse, Method, RequestBody, Transport};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::gateway::record::SessionRecord;

/// Whether a 401 response invalidates the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policing {
    Enforced,
    Exempt,
}

/// Request relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    /// Appended to `path` one percent-encoded segment each, so a `/` inside
    /// a value is sent as `%2F`.
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub policing: Policing,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            segments: Vec::new(),
            query: Vec::new(),
            body: RequestBody::Empty,
            policing: Policing::Enforced,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn segment(mut self, value: impl Into<String>) -> Self {
        self.segments.push(value.into());
        self
    }

    #[must_use]
    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_owned(), value.into()));
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] if `body` cannot be serialized.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body).map_err(|e| ClientError::Decode(e.to_string()))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    #[must_use]
    pub fn bytes(mut self, body: Vec<u8>) -> Self {
        self.body = RequestBody::Bytes(body);
        self
    }

    #[must_use]
    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    #[must_use]
    pub fn exempt(mut self) -> Self {
        self.policing = Policing::Exempt;
        self
    }
}

/// Transport wrapper shared by the gateway and every feature API.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    session_header: String,
    record: Arc<SessionRecord>,
    events: Arc<SessionEvents>,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: &ClientConfig,
        record: Arc<SessionRecord>,
        events: Arc<SessionEvents>,
    ) -> Self {
        Self {
            transport,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            session_header: config.session_header.clone(),
            record,
            events,
        }
    }

    #[must_use]
    pub fn events(&self) -> &Arc<SessionEvents> {
        &self.events
    }

    /// Send a request and return the raw response for any status except a
    /// policed 401.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Transport`] when no response was received.
    /// - [`ClientError::Unauthorized`] for a 401 on a policed request.
    /// - [`ClientError::Config`] when the URL cannot be built.
    pub async fn send(&self, request: ApiRequest) -> Result<HttpResponse, ClientError> {
        let token = self.record.session_id();
        let url = self.url_for(&request)?;

        let mut headers = Vec::with_capacity(1);
        if let Some(token) = &token {
            headers.push((self.session_header.clone(), token.clone()));
        }

        let http = HttpRequest { method: request.method, url, headers, body: request.body };
        tracing::debug!(method = %http.method, url = %http.url, "dispatching request");
        let response = self.transport.execute(http).await?;

        if response.status == 401 && request.policing == Policing::Enforced {
            self.invalidate(token.as_deref());
            return Err(ClientError::Unauthorized);
        }
        Ok(response)
    }

    /// Send a request and unwrap the envelope's `data`.
    ///
    /// # Errors
    ///
    /// Everything [`ApiClient::send`] returns, plus [`ClientError::Rejected`]
    /// for failure envelopes and non-2xx statuses and [`ClientError::Decode`]
    /// for bodies that are not an envelope carrying `data`.
    pub async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let response = self.send(request).await?;
        decode_envelope::<T>(&response)?
            .data
            .ok_or_else(|| ClientError::Decode("response envelope has no data".to_owned()))
    }

    /// Send a request whose envelope carries no payload.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::call`], minus the missing-data case.
    pub async fn call_unit(&self, request: ApiRequest) -> Result<(), ClientError> {
        let response = self.send(request).await?;
        decode_envelope::<serde_json::Value>(&response)?;
        Ok(())
    }

    /// Send a request whose success body is raw bytes rather than an envelope.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::send`], plus [`ClientError::Rejected`] for non-2xx.
    pub async fn fetch_bytes(&self, request: ApiRequest) -> Result<Vec<u8>, ClientError> {
        let response = self.send(request).await?;
        if !response.is_success() {
            return Err(rejection(&response));
        }
        Ok(response.body)
    }

    fn url_for(&self, request: &ApiRequest) -> Result<String, ClientError> {
        let raw = format!("{}/{}", self.base_url, request.path.trim_start_matches('/'));
        if request.query.is_empty() && request.segments.is_empty() {
            return Ok(raw);
        }
        let mut url = Url::parse(&raw).map_err(|e| ClientError::Config(format!("invalid URL '{raw}': {e}")))?;
        if !request.segments.is_empty() {
            url.path_segments_mut()
                .map_err(|()| ClientError::Config(format!("URL '{raw}' cannot take path segments")))?
                .pop_if_empty()
                .extend(&request.segments);
        }
        if !request.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url.into())
    }

    fn invalidate(&self, token: Option<&str>) {
        let Some(token) = token else {
            tracing::debug!("401 on anonymous request; nothing to invalidate");
            return;
        };
        if self.record.purge_if_current(token) {
            tracing::warn!("session rejected by backend; purged persisted session");
            self.events.emit_invalidated();
        }
    }
}

/// Decode a response as an envelope, turning failures into [`ClientError::Rejected`].
///
/// # Errors
///
/// Returns [`ClientError::Rejected`] for a non-2xx status or `success: false`,
/// and [`ClientError::Decode`] for a 2xx body that is not an envelope.
pub fn decode_envelope<T: DeserializeOwned>(response: &HttpResponse) -> Result<ApiResponse<T>, ClientError> {
    if !response.is_success() {
        return Err(rejection(response));
    }
    let env: ApiResponse<T> = response.json()?;
    if !env.success {
        return Err(ClientError::Rejected { status: Some(response.status), message: env.failure_message() });
    }
    Ok(env)
}

fn rejection(response: &HttpResponse) -> ClientError {
    let message =
        envelope::error_field(&response.body).unwrap_or_else(|| envelope::status_failure_message(response.status));
    ClientError::Rejected { status: Some(response.status), message }
}
