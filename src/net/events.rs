//! Session-invalidated notifications.
//!
//! DESIGN
//! ======
//! The transport layer must not know about navigation. When a policed request
//! comes back 401, `ApiClient` purges the durable record and emits one
//! [`SessionInvalidated`] here; the application shell registers a listener
//! that performs the redirect, and the session store registers one that drops
//! its in-memory session.
//!
//! Listeners are cloned out of the registry before they run, so a listener may
//! register or remove listeners without deadlocking.

#[cfg(test)]
#[path = "events_test.rs"]
mod events_test;

use std::sync::Arc;

use parking_lot::Mutex;

/// Emitted once per purged session record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInvalidated {
    /// Client route of the authentication entry point.
    pub redirect_to: String,
}

/// Handle returned by [`SessionEvents::on_invalidated`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&SessionInvalidated) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(ListenerId, Listener)>,
}

/// Registry of session-invalidated listeners.
pub struct SessionEvents {
    auth_route: String,
    registry: Mutex<Registry>,
}

impl SessionEvents {
    pub fn new(auth_route: impl Into<String>) -> Self {
        Self { auth_route: auth_route.into(), registry: Mutex::new(Registry::default()) }
    }

    #[must_use]
    pub fn auth_route(&self) -> &str {
        &self.auth_route
    }

    /// Register `listener`; it runs on every future invalidation until removed.
    pub fn on_invalidated<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SessionInvalidated) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Unregister a listener. Returns `false` if it was already gone.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.lock();
        let before = registry.listeners.len();
        registry.listeners.retain(|(existing, _)| *existing != id);
        registry.listeners.len() != before
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.registry.lock().listeners.len()
    }

    pub(crate) fn emit_invalidated(&self) {
        let event = SessionInvalidated { redirect_to: self.auth_route.clone() };
        let listeners: Vec<Listener> = self
            .registry
            .lock()
            .listeners
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        tracing::info!(redirect_to = %event.redirect_to, listeners = listeners.len(), "session invalidated");
        for listener in listeners {
            listener(&event);
        }
    }
}
