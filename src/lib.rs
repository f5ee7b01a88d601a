//! Client library for the distributed file storage web service.
//!
//! ARCHITECTURE
//! ============
//! - [`gateway::AuthGateway`] owns the durable session record and the shared
//!   [`net::ApiClient`] every backend call goes through.
//! - [`session::SessionStore`] is the in-memory auth state machine. It is the
//!   only writer of the published [`session::SessionState`].
//! - [`files::FilesApi`] issues file-browser calls on the same client, so a
//!   401 anywhere ends the session everywhere.
//!
//! [`Client`] wires the three together.

pub mod config;
pub mod error;
pub mod files;
pub mod gateway;
pub mod net;
pub mod session;
pub mod storage;

#[cfg(test)]
mod test_helpers;

use std::sync::Arc;

pub use config::ClientConfig;
pub use envelope::{
    ApiResponse, AuthPayload, FileEntry, LoginCredentials, RegisterRequest, SearchHit, SearchResult, StorageInfo,
    User,
};
pub use error::{ClientError, StorageError};

use files::FilesApi;
use gateway::AuthGateway;
use net::{ReqwestTransport, Transport};
use session::SessionStore;
use storage::{FileStore, KeyValueStore};

/// Gateway, session store and files API sharing one transport and one
/// durable record.
pub struct Client {
    pub gateway: Arc<AuthGateway>,
    pub session: Arc<SessionStore>,
    pub files: FilesApi,
}

impl Client {
    /// Wire a client and hydrate its session from `store`.
    pub fn new(transport: Arc<dyn Transport>, config: &ClientConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let gateway = Arc::new(AuthGateway::new(transport, config, store));
        let session = SessionStore::new(Arc::clone(&gateway));
        let files = FilesApi::new(Arc::clone(gateway.api()));
        Self { gateway, session, files }
    }

    /// Production wiring: reqwest transport and the configured state file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = Arc::new(ReqwestTransport::new(config.timeouts)?);
        let store = Arc::new(FileStore::new(config.state_file.clone()));
        Ok(Self::new(transport, config, store))
    }
}
