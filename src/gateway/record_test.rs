use super::*;
use crate::storage::MemoryStore;
use crate::test_helpers::{ReadOnlyStore, auth_payload, sample_user};

fn record() -> (Arc<MemoryStore>, SessionRecord) {
    let storage = Arc::new(MemoryStore::new());
    let record = SessionRecord::new(storage.clone());
    (storage, record)
}

#[test]
fn save_writes_both_keys() {
    let (storage, record) = record();
    record.save(&auth_payload(sample_user("u1", "alice"), "tok-123")).unwrap();

    assert_eq!(storage.get(SESSION_ID_KEY).unwrap().as_deref(), Some("tok-123"));
    let raw = storage.get(USER_KEY).unwrap().unwrap();
    assert!(raw.contains("\"userId\":\"u1\""));
}

#[test]
fn user_round_trips_after_save() {
    let (_storage, record) = record();
    let user = sample_user("u1", "alice");
    record.save(&auth_payload(user.clone(), "tok-123")).unwrap();

    assert_eq!(record.user(), StoredUser::Present(user));
    assert_eq!(record.session_id().as_deref(), Some("tok-123"));
}

#[test]
fn missing_user_reads_as_missing() {
    let (_storage, record) = record();
    assert_eq!(record.user(), StoredUser::Missing);
    assert_eq!(record.session_id(), None);
}

#[test]
fn malformed_user_is_purged_with_token() {
    let (storage, record) = record();
    storage.set(USER_KEY, "{not json").unwrap();
    storage.set(SESSION_ID_KEY, "tok-123").unwrap();

    assert_eq!(record.user(), StoredUser::Purged);
    assert!(storage.is_empty());
    assert_eq!(record.user(), StoredUser::Missing);
}

#[test]
fn user_missing_identity_fields_is_malformed() {
    let (storage, record) = record();
    storage.set(USER_KEY, r#"{"email":"a@example.com"}"#).unwrap();

    assert_eq!(record.user(), StoredUser::Purged);
    assert_eq!(storage.get(USER_KEY).unwrap(), None);
}

#[test]
fn purge_reports_whether_token_existed() {
    let (storage, record) = record();
    record.save(&auth_payload(sample_user("u1", "alice"), "tok-123")).unwrap();

    assert!(record.purge());
    assert!(storage.is_empty());
    assert!(!record.purge());
}

#[test]
fn purge_if_current_matches_token() {
    let (storage, record) = record();
    record.save(&auth_payload(sample_user("u1", "alice"), "tok-new")).unwrap();

    assert!(!record.purge_if_current("tok-old"));
    assert_eq!(storage.len(), 2);
    assert!(record.purge_if_current("tok-new"));
    assert!(storage.is_empty());
}

#[test]
fn failed_save_leaves_nothing_behind() {
    let storage = Arc::new(ReadOnlyStore::default());
    storage.inner.set(USER_KEY, "stale").unwrap();
    let record = SessionRecord::new(storage.clone());

    let err = record.save(&auth_payload(sample_user("u1", "alice"), "tok-1"));

    assert!(err.is_err());
    assert!(storage.inner.is_empty());
}
