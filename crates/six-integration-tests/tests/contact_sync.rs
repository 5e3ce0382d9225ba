use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use six_contacts::{CheckOutcome, Error, PermissionState, PermissionStatus, RawContact, SyncReport};
use six_integration_tests::{
    address_book, coordinator, CountingProvider, FakeServer, ACCESS_TOKEN, ANON_KEY, USER_ID,
};

#[tokio::test]
async fn first_check_prompts_loads_and_connects() {
    let server = FakeServer::start(&[("5551234567", "user-ada"), ("5559990000", "user-grace")]).await;
    let provider = Arc::new(CountingProvider::new(address_book(), PermissionStatus::Granted));
    let sync = coordinator(Arc::clone(&provider), &server);

    let outcome = sync.check_and_load(true).await.unwrap();
    assert_eq!(
        outcome,
        CheckOutcome::Loaded {
            contacts: 3,
            report: Some(SyncReport {
                submitted: 2,
                matched: 2,
                connected: 2,
                failed: 0
            }),
        }
    );

    let calls = server.rpc_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].body,
        json!({"contact_last10s": ["5551234567", "5559990000"], "requesting_user": USER_ID})
    );
    assert_eq!(calls[0].apikey.as_deref(), Some(ANON_KEY));
    assert_eq!(
        calls[0].authorization.as_deref(),
        Some(format!("Bearer {ACCESS_TOKEN}").as_str())
    );

    assert_eq!(
        server.connects(),
        vec![
            json!({"userId1": USER_ID, "userId2": "user-ada"}),
            json!({"userId1": USER_ID, "userId2": "user-grace"}),
        ]
    );

    let snapshot = sync.snapshot();
    assert_eq!(snapshot.permission, PermissionState::Granted);
    assert!(!snapshot.is_loading);
    assert!(!snapshot.is_syncing);
    assert_eq!(snapshot.contact_count, 3);
    assert_eq!(provider.prompts(), 1);
}

#[tokio::test]
async fn denied_permission_never_reads_or_syncs() {
    let server = FakeServer::start(&[("5551234567", "user-ada")]).await;
    let provider = Arc::new(CountingProvider::new(address_book(), PermissionStatus::Denied));
    let sync = coordinator(Arc::clone(&provider), &server);

    let err = sync.check_and_load(true).await.unwrap_err();
    assert!(err.is_permission_denied());
    assert_eq!(sync.permission(), PermissionState::Denied);
    assert_eq!(provider.reads(), 0);
    assert!(server.rpc_calls().is_empty());
}

#[tokio::test]
async fn no_usable_numbers_skips_the_network() {
    let server = FakeServer::start(&[]).await;
    let contacts = vec![RawContact::named("Emergency").with_phone("911")];
    let provider = Arc::new(CountingProvider::new(contacts.clone(), PermissionStatus::Granted));
    let sync = coordinator(provider, &server);

    sync.check_and_load(false).await.unwrap();
    let err = sync.sync(Some(contacts.into())).await.unwrap_err();

    assert_eq!(err, Error::NoContacts);
    assert!(server.rpc_calls().is_empty());
    assert!(!sync.is_syncing());
}

#[tokio::test]
async fn unmatched_contacts_surface_as_sync_error() {
    let server = FakeServer::start(&[]).await;
    let provider = Arc::new(CountingProvider::new(address_book(), PermissionStatus::Granted));
    let sync = coordinator(provider, &server);

    let err = sync.check_and_load(true).await.unwrap_err();
    assert!(matches!(err, Error::Sync(_)), "unexpected error: {err}");
    assert_eq!(server.rpc_calls().len(), 1);
    assert!(!sync.is_syncing());
    assert!(!sync.is_loading());
}

#[tokio::test]
async fn concurrent_triggers_share_one_cycle() {
    let server = FakeServer::start_with_delay(
        &[("5551234567", "user-ada")],
        Duration::from_millis(50),
    )
    .await;
    let provider = Arc::new(
        CountingProvider::new(address_book(), PermissionStatus::Granted)
            .with_read_delay(Duration::from_millis(20)),
    );
    let sync = coordinator(Arc::clone(&provider), &server);

    let (a, b, c) = tokio::join!(
        sync.check_and_load(true),
        sync.check_and_load(true),
        sync.check_and_load(true)
    );

    let a = a.unwrap();
    assert_eq!(a, b.unwrap());
    assert_eq!(a, c.unwrap());
    assert_eq!(provider.prompts(), 1);
    assert_eq!(provider.reads(), 1);
    assert_eq!(server.rpc_calls().len(), 1);
}

#[tokio::test]
async fn concurrent_syncs_send_one_request() {
    let server = FakeServer::start_with_delay(
        &[("5551234567", "user-ada")],
        Duration::from_millis(50),
    )
    .await;
    let provider = Arc::new(CountingProvider::new(address_book(), PermissionStatus::Granted));
    let sync = coordinator(provider, &server);
    sync.check_and_load(false).await.unwrap();

    let (first, second) = tokio::join!(sync.sync(None), sync.sync(None));

    assert_eq!(first.unwrap(), second.unwrap());
    assert_eq!(server.rpc_calls().len(), 1);
    assert!(!sync.is_syncing());
}

#[tokio::test]
async fn repeat_check_inside_window_reuses_contacts() {
    let server = FakeServer::start(&[("5551234567", "user-ada")]).await;
    let provider = Arc::new(CountingProvider::new(address_book(), PermissionStatus::Granted));
    let sync = coordinator(Arc::clone(&provider), &server);

    sync.check_and_load(false).await.unwrap();
    sync.check_and_load(false).await.unwrap();
    assert_eq!(provider.reads(), 1);

    sync.reload().await.unwrap();
    assert_eq!(provider.reads(), 2);
    assert_eq!(server.rpc_calls().len(), 1);
}

#[tokio::test]
async fn view_observes_the_attach_check() {
    let server = FakeServer::start(&[("5551234567", "user-ada")]).await;
    let provider = Arc::new(CountingProvider::new(address_book(), PermissionStatus::Granted));
    let sync = coordinator(provider, &server);

    let mut view = sync.attach(true);
    let outcome = view.initial_check().await.unwrap().unwrap();

    assert!(outcome.report().is_some());
    let snapshot = view.snapshot();
    assert_eq!(snapshot.permission, PermissionState::Granted);
    assert!(!snapshot.is_syncing);
}
