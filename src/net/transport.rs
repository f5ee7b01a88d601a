//! HTTP transport seam.
//!
//! `ApiClient` speaks to the backend only through [`Transport`], so tests can
//! substitute a scripted double and the production build uses
//! [`ReqwestTransport`]. Requests and responses are plain values; status
//! handling and envelope decoding happen above this layer.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::config::Timeouts;
use crate::error::ClientError;

pub use reqwest::Method;

/// Outgoing request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Bytes(Vec<u8>),
    Multipart(Vec<FormPart>),
}

/// One named field of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File { file_name: String, bytes: Vec<u8> },
}

impl FormPart {
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: FormValue::Text(value.into()) }
    }

    #[must_use]
    pub fn file(name: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), value: FormValue::File { file_name: file_name.into(), bytes } }
    }
}

/// Fully resolved request handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl HttpRequest {
    /// Value of the first header named `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw response as received from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// One request in, one response out.
///
/// Implementations return `Ok` for every HTTP status, including 4xx/5xx;
/// `Err` means no response was received.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ClientError>;
}

// =============================================================================
// REQWEST
// =============================================================================

/// Production [`Transport`] backed by a shared `reqwest::Client`.
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the HTTP client cannot be built.
    pub fn new(timeouts: Timeouts) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ClientError::Transport(format!("http client build failed: {e}")))?;
        Ok(Self { http })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let mut builder = self.http.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Bytes(bytes) => builder.header(reqwest::header::CONTENT_TYPE, "application/octet-stream").body(bytes),
            RequestBody::Multipart(parts) => builder.multipart(multipart_form(parts)),
        };

        let response = builder.send().await.map_err(|e| ClientError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(HttpResponse { status, body: body.to_vec() })
    }
}

fn multipart_form(parts: Vec<FormPart>) -> reqwest::multipart::Form {
    parts.into_iter().fold(reqwest::multipart::Form::new(), |form, part| match part.value {
        FormValue::Text(text) => form.text(part.name, text),
        FormValue::File { file_name, bytes } => {
            form.part(part.name, reqwest::multipart::Part::bytes(bytes).file_name(file_name))
        }
    })
}
