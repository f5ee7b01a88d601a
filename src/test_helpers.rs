//! Shared fixtures and test doubles.

use std::collections::VecDeque;
use std::sync::Arc;

use envelope::{ApiResponse, AuthPayload, User};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::config::ClientConfig;
use crate::error::{ClientError, StorageError};
use crate::gateway::AuthGateway;
use crate::net::transport::{HttpRequest, HttpResponse, Method, Transport};
use crate::storage::{KeyValueStore, MemoryStore};

pub const BASE_URL: &str = "http://backend.test/api";

#[must_use]
pub fn test_config() -> ClientConfig {
    ClientConfig { base_url: BASE_URL.to_owned(), ..ClientConfig::default() }
}

#[must_use]
pub fn sample_user(id: &str, username: &str) -> User {
    User {
        user_id: id.to_owned(),
        username: username.to_owned(),
        email: format!("{username}@example.com"),
        created_at: "2024-01-01T00:00:00Z".to_owned(),
        last_login_at: None,
        active: true,
        user_directory: format!("/users/{username}"),
        quota_limit: 1024 * 1024,
        current_usage: 512,
    }
}

#[must_use]
pub fn auth_payload(user: User, token: &str) -> AuthPayload {
    AuthPayload { user, session_id: token.to_owned() }
}

// =============================================================================
// MockTransport
// =============================================================================

/// Scripted reply for one request.
pub enum Reply {
    Respond(HttpResponse),
    /// Transport-level failure (no response received).
    Fail(String),
    /// Wait for the notify before responding.
    Gated(Arc<Notify>, HttpResponse),
}

#[must_use]
pub fn json_reply(status: u16, value: &serde_json::Value) -> Reply {
    Reply::Respond(HttpResponse { status, body: value.to_string().into_bytes() })
}

#[must_use]
pub fn ok_reply<T: serde::Serialize>(data: &T) -> Reply {
    json_reply(200, &envelope_json(&ApiResponse::ok(data, "ok")))
}

#[must_use]
pub fn fail_reply(status: u16, error: &str) -> Reply {
    json_reply(status, &envelope_json(&ApiResponse::<()>::fail(error)))
}

#[must_use]
pub fn login_reply(user: &User, token: &str) -> Reply {
    ok_reply(&auth_payload(user.clone(), token))
}

fn envelope_json<T: serde::Serialize>(env: &ApiResponse<T>) -> serde_json::Value {
    serde_json::to_value(env).expect("envelope serializes")
}

struct Route {
    method: Method,
    path: String,
    replies: VecDeque<Reply>,
}

/// Transport double keyed by method and URL path. Each route answers its
/// queued replies in order; unmatched requests get a 404 failure envelope.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue `reply` for the next `method` request whose URL path is `path`.
    pub fn on(&self, method: Method, path: &str, reply: Reply) {
        let mut routes = self.routes.lock();
        if let Some(route) = routes.iter_mut().find(|r| r.method == method && r.path == path) {
            route.replies.push_back(reply);
            return;
        }
        routes.push(Route { method, path: path.to_owned(), replies: VecDeque::from([reply]) });
    }

    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests().into_iter().filter(|r| url_path(&r.url) == path).collect()
    }

    fn next_reply(&self, request: &HttpRequest) -> Option<Reply> {
        let path = url_path(&request.url);
        let mut routes = self.routes.lock();
        routes
            .iter_mut()
            .find(|r| r.method == request.method && r.path == path && !r.replies.is_empty())
            .and_then(|r| r.replies.pop_front())
    }
}

/// Path relative to [`BASE_URL`], query string stripped.
fn url_path(url: &str) -> String {
    let without_base = url.strip_prefix(BASE_URL).unwrap_or(url);
    without_base.split('?').next().unwrap_or_default().to_owned()
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let reply = self.next_reply(&request);
        self.requests.lock().push(request);
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(ClientError::Transport(message)),
            Some(Reply::Gated(gate, response)) => {
                gate.notified().await;
                Ok(response)
            }
            None => Ok(HttpResponse {
                status: 404,
                body: envelope_json(&ApiResponse::<()>::fail("no mock route")).to_string().into_bytes(),
            }),
        }
    }
}

// =============================================================================
// Storage doubles
// =============================================================================

/// Store whose writes always fail; reads delegate to an inner memory store.
#[derive(Default)]
pub struct ReadOnlyStore {
    pub inner: MemoryStore,
}

impl KeyValueStore for ReadOnlyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only")))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}

/// Gateway wired to a fresh mock transport and memory store.
pub struct Harness {
    pub transport: Arc<MockTransport>,
    pub storage: Arc<MemoryStore>,
    pub gateway: Arc<AuthGateway>,
}

impl Harness {
    #[must_use]
    pub fn new() -> Self {
        Self::with_storage(Arc::new(MemoryStore::new()))
    }

    #[must_use]
    pub fn with_storage(storage: Arc<MemoryStore>) -> Self {
        let transport = MockTransport::new();
        let gateway = Arc::new(AuthGateway::new(transport.clone(), &test_config(), storage.clone()));
        Self { transport, storage, gateway }
    }

    /// Seed a persisted record as a previous run would have left it.
    pub fn persist(&self, user: &User, token: &str) {
        let raw = serde_json::to_string(user).expect("user serializes");
        self.storage.set("user", &raw).expect("memory store write");
        self.storage.set("sessionId", token).expect("memory store write");
    }

    #[must_use]
    pub fn stored(&self, key: &str) -> Option<String> {
        self.storage.get(key).unwrap_or_default()
    }
}
