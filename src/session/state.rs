//! Session state and its reducer.
//!
//! DESIGN
//! ======
//! `reduce` is pure: every mutation of the in-memory session is one
//! [`AuthAction`] applied to the previous [`SessionState`]. Every arm sets
//! `user` and `is_authenticated` together, which keeps
//! `is_authenticated == user.is_some()` true after any sequence of actions.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use envelope::User;

/// In-memory session published to the UI.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    /// True strictly between an auth attempt starting and resolving.
    pub is_loading: bool,
    /// Last failure message; cleared explicitly or by the next attempt.
    pub error: Option<String>,
}

/// Coarse view of [`SessionState`] for routing decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Anonymous,
    Authenticating,
    Authenticated,
    Failed,
}

impl SessionState {
    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.is_loading {
            Phase::Authenticating
        } else if self.is_authenticated {
            Phase::Authenticated
        } else if self.error.is_some() {
            Phase::Failed
        } else {
            Phase::Anonymous
        }
    }

    /// Name of the signed-in user, if any.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }
}

/// The only ways the session state changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthAction {
    Start,
    Success(User),
    Error(String),
    Logout,
    /// Restore a persisted user at startup.
    SetUser(User),
    ClearError,
}

impl AuthAction {
    /// Wire-style action name, used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Start => "AUTH_START",
            Self::Success(_) => "AUTH_SUCCESS",
            Self::Error(_) => "AUTH_ERROR",
            Self::Logout => "AUTH_LOGOUT",
            Self::SetUser(_) => "SET_USER",
            Self::ClearError => "CLEAR_ERROR",
        }
    }
}

/// Apply `action` to `state`.
#[must_use]
pub fn reduce(state: &SessionState, action: AuthAction) -> SessionState {
    match action {
        AuthAction::Start => SessionState { is_loading: true, error: None, ..state.clone() },
        AuthAction::Success(user) => {
            SessionState { user: Some(user), is_authenticated: true, is_loading: false, error: None }
        }
        AuthAction::Error(message) => {
            SessionState { user: None, is_authenticated: false, is_loading: false, error: Some(message) }
        }
        AuthAction::Logout => SessionState::default(),
        AuthAction::SetUser(user) => SessionState { user: Some(user), is_authenticated: true, ..state.clone() },
        AuthAction::ClearError => SessionState { error: None, ..state.clone() },
    }
}
