//! In-memory session: the reducer and the store that drives it.

pub mod state;
pub mod store;

pub use state::{AuthAction, Phase, SessionState, reduce};
pub use store::SessionStore;
