use super::*;
use crate::net::{HttpResponse, Method, RequestBody};
use crate::storage::MemoryStore;
use crate::test_helpers::{
    Harness, MockTransport, ReadOnlyStore, Reply, fail_reply, json_reply, login_reply, sample_user, test_config,
};

// =============================================================================
// login / register
// =============================================================================

#[tokio::test]
async fn login_persists_record_and_returns_payload() {
    let h = Harness::new();
    let alice = sample_user("u1", "alice");
    h.transport.on(Method::POST, "/user/login", login_reply(&alice, "tok-123"));

    let payload = h.gateway.login(&LoginCredentials::new("alice", "secret")).await.unwrap();

    assert_eq!(payload.user, alice);
    assert_eq!(payload.session_id, "tok-123");
    assert_eq!(h.stored("sessionId").as_deref(), Some("tok-123"));
    assert_eq!(h.gateway.current_user(), Some(alice));
    assert!(h.gateway.is_authenticated());
}

#[tokio::test]
async fn login_posts_credentials_as_json() {
    let h = Harness::new();
    h.transport.on(Method::POST, "/user/login", login_reply(&sample_user("u1", "alice"), "tok-1"));

    h.gateway.login(&LoginCredentials::new("alice", "secret")).await.unwrap();

    let sent = h.transport.requests_to("/user/login");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, Method::POST);
    assert_eq!(
        sent[0].body,
        RequestBody::Json(serde_json::json!({ "username": "alice", "password": "secret" }))
    );
}

#[tokio::test]
async fn login_rejection_uses_error_field_and_writes_nothing() {
    let h = Harness::new();
    h.transport.on(Method::POST, "/user/login", fail_reply(200, "Invalid credentials"));

    let err = h.gateway.login(&LoginCredentials::new("alice", "wrong")).await.unwrap_err();

    assert!(matches!(err, ClientError::Rejected { .. }));
    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(h.storage.is_empty());
}

#[tokio::test]
async fn login_401_is_a_rejection_not_an_invalidation() {
    let h = Harness::new();
    h.persist(&sample_user("u0", "previous"), "tok-old");
    h.transport.on(Method::POST, "/user/login", fail_reply(401, "Invalid credentials"));

    let err = h.gateway.login(&LoginCredentials::new("alice", "wrong")).await.unwrap_err();

    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(err.status(), Some(401));
    assert_eq!(h.stored("sessionId").as_deref(), Some("tok-old"));
}

#[tokio::test]
async fn login_transport_failure_surfaces_transport_text() {
    let h = Harness::new();
    h.transport.on(Method::POST, "/user/login", Reply::Fail("error sending request: connection refused".to_owned()));

    let err = h.gateway.login(&LoginCredentials::new("alice", "secret")).await.unwrap_err();

    assert!(matches!(err, ClientError::Transport(_)));
    assert_eq!(err.to_string(), "error sending request: connection refused");
    assert!(h.storage.is_empty());
}

#[tokio::test]
async fn login_non_json_error_falls_back_to_status_text() {
    let h = Harness::new();
    h.transport.on(
        Method::POST,
        "/user/login",
        Reply::Respond(HttpResponse { status: 500, body: b"Internal Server Error".to_vec() }),
    );

    let err = h.gateway.login(&LoginCredentials::new("alice", "secret")).await.unwrap_err();

    assert_eq!(err.to_string(), "request failed with status code 500");
}

#[tokio::test]
async fn login_storage_failure_is_reported() {
    let transport = MockTransport::new();
    let storage = Arc::new(ReadOnlyStore::default());
    let gateway = AuthGateway::new(transport.clone(), &test_config(), storage.clone());
    transport.on(Method::POST, "/user/login", login_reply(&sample_user("u1", "alice"), "tok-1"));

    let err = gateway.login(&LoginCredentials::new("alice", "secret")).await.unwrap_err();

    assert!(matches!(err, ClientError::Storage(_)));
    assert!(storage.inner.is_empty());
    assert!(!gateway.is_authenticated());
}

#[tokio::test]
async fn register_posts_user_data_and_persists() {
    let h = Harness::new();
    let bob = sample_user("u2", "bob");
    h.transport.on(Method::POST, "/user/register", login_reply(&bob, "tok-bob"));

    let payload = h
        .gateway
        .register(&RegisterRequest::new("bob", "bob@example.com", "pw"))
        .await
        .unwrap();

    assert_eq!(payload.user.username, "bob");
    assert_eq!(h.gateway.session_id().as_deref(), Some("tok-bob"));
    let sent = &h.transport.requests_to("/user/register")[0];
    assert_eq!(
        sent.body,
        RequestBody::Json(serde_json::json!({ "username": "bob", "email": "bob@example.com", "password": "pw" }))
    );
}

#[tokio::test]
async fn register_rejection_message_from_envelope() {
    let h = Harness::new();
    h.transport.on(Method::POST, "/user/register", fail_reply(409, "Username already exists"));

    let err = h
        .gateway
        .register(&RegisterRequest::new("bob", "bob@example.com", "pw"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Username already exists");
    assert!(h.storage.is_empty());
}

// =============================================================================
// logout
// =============================================================================

#[tokio::test]
async fn logout_sends_token_then_clears_record() {
    let h = Harness::new();
    h.persist(&sample_user("u1", "alice"), "tok-123");
    h.transport.on(Method::POST, "/user/logout", json_reply(200, &serde_json::json!({ "success": true })));

    h.gateway.logout().await.unwrap();

    let sent = &h.transport.requests_to("/user/logout")[0];
    assert_eq!(sent.header("X-Session-ID"), Some("tok-123"));
    assert!(h.storage.is_empty());
}

#[tokio::test]
async fn logout_clears_record_even_when_remote_fails() {
    let h = Harness::new();
    h.persist(&sample_user("u1", "alice"), "tok-123");
    h.transport.on(Method::POST, "/user/logout", Reply::Fail("timeout".to_owned()));

    let err = h.gateway.logout().await.unwrap_err();

    assert_eq!(err.to_string(), "timeout");
    assert!(h.storage.is_empty());
    assert!(!h.gateway.is_authenticated());
}

#[tokio::test]
async fn logout_remote_401_does_not_emit_invalidation() {
    let h = Harness::new();
    h.persist(&sample_user("u1", "alice"), "tok-123");
    h.transport.on(Method::POST, "/user/logout", fail_reply(401, "Session expired"));
    let fired = Arc::new(parking_lot::Mutex::new(0));
    let counter = Arc::clone(&fired);
    h.gateway.events().on_invalidated(move |_| *counter.lock() += 1);

    assert!(h.gateway.logout().await.is_err());

    assert_eq!(*fired.lock(), 0);
    assert!(h.storage.is_empty());
}

// =============================================================================
// queries
// =============================================================================

#[test]
fn current_user_malformed_record_reads_as_absent_and_is_purged() {
    let storage = Arc::new(MemoryStore::new());
    storage.set("user", "undefined").unwrap();
    storage.set("sessionId", "tok-1").unwrap();
    let gateway = AuthGateway::new(MockTransport::new(), &test_config(), storage.clone());

    assert_eq!(gateway.current_user(), None);
    assert!(storage.is_empty());
    assert_eq!(gateway.current_user(), None);
}

#[test]
fn is_authenticated_requires_both_halves() {
    let h = Harness::new();
    h.storage.set("sessionId", "tok-1").unwrap();
    assert!(!h.gateway.is_authenticated());

    h.persist(&sample_user("u1", "alice"), "tok-1");
    assert!(h.gateway.is_authenticated());
}

#[test]
fn clear_session_is_idempotent() {
    let h = Harness::new();
    h.persist(&sample_user("u1", "alice"), "tok-1");

    assert!(h.gateway.clear_session());
    assert!(!h.gateway.clear_session());
    assert!(h.storage.is_empty());
}
