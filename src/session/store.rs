//! Session store: the in-memory auth state machine consumed by the UI.
//!
//! ARCHITECTURE
//! ============
//! The store is the single writer of [`SessionState`] and publishes it through
//! a `watch` channel. It reaches the backend and durable storage only through
//! the injected [`AuthGateway`].
//!
//! CONCURRENCY
//! ===========
//! Every auth action takes a generation number. `generation` doubles as the
//! commit lock: whoever holds it may write the durable record and dispatch in
//! one step, so memory and storage never disagree. It is never held across an
//! `.await`.
//!
//! - login/register: network exchange first, then under the lock either
//!   commit (generation still latest) or drop the response as superseded.
//! - logout: remote notification first, then purge + `AUTH_LOGOUT` under the
//!   lock, bumping the generation so in-flight attempts become stale.
//! - invalidation (401 on a policed call): same commit as logout.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::sync::{Arc, Weak};

use envelope::{LoginCredentials, RegisterRequest, User};
use parking_lot::Mutex;
use tokio::sync::watch;

use super::state::{AuthAction, SessionState, reduce};
use crate::error::ClientError;
use crate::gateway::record::StoredUser;
use crate::gateway::{AuthGateway, Exchange};
use crate::net::ListenerId;

pub struct SessionStore {
    gateway: Arc<AuthGateway>,
    state: watch::Sender<SessionState>,
    generation: Mutex<u64>,
    listener: ListenerId,
}

impl SessionStore {
    /// Build the store, hydrate it from the persisted record and subscribe it
    /// to session-invalidated events. Hydration runs exactly once, here.
    pub fn new(gateway: Arc<AuthGateway>) -> Arc<Self> {
        let store = Arc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let listener = gateway.events().on_invalidated(move |_| {
                if let Some(store) = weak.upgrade() {
                    store.on_invalidated();
                }
            });
            let (state, _) = watch::channel(SessionState::default());
            Self { gateway, state, generation: Mutex::new(0), listener }
        });
        store.hydrate();
        store
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    #[must_use]
    pub fn gateway(&self) -> &Arc<AuthGateway> {
        &self.gateway
    }

    /// Log in and publish the resulting session.
    ///
    /// # Errors
    ///
    /// Returns the gateway failure after recording its text as the state's
    /// `error`, or [`ClientError::Superseded`] if a newer auth action was
    /// issued before the response arrived.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User, ClientError> {
        self.authenticate(Exchange::Login(credentials)).await
    }

    /// Register and publish the resulting session.
    ///
    /// # Errors
    ///
    /// Same as [`SessionStore::login`].
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ClientError> {
        self.authenticate(Exchange::Register(request)).await
    }

    /// End the session. Never fails: a remote error is logged and the local
    /// session is cleared regardless.
    pub async fn logout(&self) {
        if let Err(e) = self.gateway.notify_logout().await {
            tracing::warn!(error = %e, "remote logout failed; clearing local session anyway");
        }
        self.end_session();
        tracing::info!("logged out");
    }

    /// Drop the recorded error. No-op, and no notification, if none is set.
    pub fn clear_error(&self) {
        self.dispatch(AuthAction::ClearError);
    }

    async fn authenticate(&self, exchange: Exchange<'_>) -> Result<User, ClientError> {
        let generation = self.begin();
        let outcome = self.gateway.exchange(exchange).await;

        let latest = self.generation.lock();
        if *latest != generation {
            tracing::warn!(generation, latest = *latest, "discarding superseded auth response");
            return Err(ClientError::Superseded);
        }

        let committed = outcome.and_then(|payload| {
            self.gateway.persist(&payload)?;
            Ok(payload.user)
        });
        match committed {
            Ok(user) => {
                tracing::info!(user_id = %user.user_id, "authenticated");
                self.dispatch(AuthAction::Success(user.clone()));
                Ok(user)
            }
            Err(e) => {
                // The state is about to read unauthenticated; storage must agree.
                self.gateway.clear_session();
                self.dispatch(AuthAction::Error(e.to_string()));
                Err(e)
            }
        }
    }

    fn begin(&self) -> u64 {
        let mut latest = self.generation.lock();
        *latest += 1;
        self.dispatch(AuthAction::Start);
        *latest
    }

    fn end_session(&self) {
        let mut latest = self.generation.lock();
        *latest += 1;
        self.gateway.clear_session();
        self.dispatch(AuthAction::Logout);
    }

    fn on_invalidated(&self) {
        tracing::info!("session invalidated by backend");
        self.end_session();
    }

    fn hydrate(&self) {
        let _latest = self.generation.lock();
        let user = self.gateway.stored_user();
        let token = self.gateway.session_id();
        match (user, token) {
            (StoredUser::Present(user), Some(_)) => {
                tracing::info!(user_id = %user.user_id, "restored persisted session");
                self.dispatch(AuthAction::SetUser(user));
            }
            (StoredUser::Missing | StoredUser::Purged, None) => {}
            (_, _) => {
                tracing::warn!("discarding incomplete persisted session");
                self.gateway.clear_session();
            }
        }
    }

    fn dispatch(&self, action: AuthAction) {
        let kind = action.kind();
        let changed = self.state.send_if_modified(|state| {
            let next = reduce(state, action);
            if next == *state {
                return false;
            }
            *state = next;
            true
        });
        tracing::debug!(action = kind, changed, "session action");
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.gateway.events().remove(self.listener);
    }
}
