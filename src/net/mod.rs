//! Network layer: transport seam, shared API client, invalidation events.

pub mod client;
pub mod events;
pub mod transport;

pub use client::{ApiClient, ApiRequest, Policing};
pub use events::{ListenerId, SessionEvents, SessionInvalidated};
pub use transport::{FormPart, FormValue, HttpRequest, HttpResponse, Method, RequestBody, ReqwestTransport, Transport};
