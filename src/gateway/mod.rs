//! Auth gateway: boundary to the remote identity service.
//!
//! ARCHITECTURE
//! ============
//! The gateway owns the durable session record and the shared [`ApiClient`]
//! that attaches the record's token to every request. It performs the three
//! identity exchanges (`/user/login`, `/user/register`, `/user/logout`) and
//! answers the local queries the UI needs at startup.
//!
//! Each exchange is split in two steps: the network call, then persisting the
//! returned record. The public `login`/`register` run both back to back. The
//! session store runs them separately so it can drop a stale response before
//! anything is written.

pub mod record;

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;

use std::sync::Arc;

use envelope::{AuthPayload, LoginCredentials, RegisterRequest, User};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::net::{ApiClient, ApiRequest, SessionEvents, Transport};
use crate::storage::KeyValueStore;
use record::{SessionRecord, StoredUser};

const LOGIN_PATH: &str = "/user/login";
const REGISTER_PATH: &str = "/user/register";
const LOGOUT_PATH: &str = "/user/logout";

/// One of the two credential exchanges that yield a session.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Exchange<'a> {
    Login(&'a LoginCredentials),
    Register(&'a RegisterRequest),
}

pub struct AuthGateway {
    api: Arc<ApiClient>,
    record: Arc<SessionRecord>,
}

impl AuthGateway {
    /// Wire the gateway to a transport and a durable store.
    pub fn new(transport: Arc<dyn Transport>, config: &ClientConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let record = Arc::new(SessionRecord::new(store));
        let events = Arc::new(SessionEvents::new(config.auth_route.clone()));
        let api = Arc::new(ApiClient::new(transport, config, Arc::clone(&record), events));
        Self { api, record }
    }

    /// Shared client for every other backend call.
    #[must_use]
    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Session-invalidated events raised by the shared client.
    #[must_use]
    pub fn events(&self) -> &Arc<SessionEvents> {
        self.api.events()
    }

    /// Exchange credentials for a session and persist it.
    ///
    /// # Errors
    ///
    /// [`ClientError::Rejected`] with the backend's message when the
    /// credentials are refused, [`ClientError::Transport`] when the backend is
    /// unreachable, [`ClientError::Storage`] when the record cannot be written.
    /// Nothing is persisted on failure.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthPayload, ClientError> {
        let payload = self.exchange(Exchange::Login(credentials)).await?;
        self.persist(&payload)?;
        Ok(payload)
    }

    /// Create an account, receive its first session and persist it.
    ///
    /// # Errors
    ///
    /// Same as [`AuthGateway::login`].
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthPayload, ClientError> {
        let payload = self.exchange(Exchange::Register(request)).await?;
        self.persist(&payload)?;
        Ok(payload)
    }

    /// Tell the backend the session is over, then clear the local record
    /// whatever the backend said.
    ///
    /// # Errors
    ///
    /// Returns the remote failure for the caller to log; the local record is
    /// already gone when it does.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let remote = self.notify_logout().await;
        self.clear_session();
        remote
    }

    /// Persisted user, or `None` when absent or malformed.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        match self.record.user() {
            StoredUser::Present(user) => Some(user),
            StoredUser::Missing | StoredUser::Purged => None,
        }
    }

    /// Persisted session token, or `None`.
    #[must_use]
    pub fn session_id(&self) -> Option<String> {
        self.record.session_id()
    }

    /// True iff both halves of the record are present and readable.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some() && self.session_id().is_some()
    }

    /// Remove the durable record. Returns whether a token was present.
    pub fn clear_session(&self) -> bool {
        self.record.purge()
    }

    pub(crate) fn stored_user(&self) -> StoredUser {
        self.record.user()
    }

    pub(crate) async fn exchange(&self, exchange: Exchange<'_>) -> Result<AuthPayload, ClientError> {
        let request = match exchange {
            Exchange::Login(credentials) => ApiRequest::post(LOGIN_PATH).json(credentials)?,
            Exchange::Register(request) => ApiRequest::post(REGISTER_PATH).json(request)?,
        };
        self.api.call::<AuthPayload>(request.exempt()).await
    }

    pub(crate) fn persist(&self, payload: &AuthPayload) -> Result<(), ClientError> {
        self.record.save(payload)?;
        Ok(())
    }

    pub(crate) async fn notify_logout(&self) -> Result<(), ClientError> {
        self.api.call_unit(ApiRequest::post(LOGOUT_PATH).exempt()).await
    }
}
