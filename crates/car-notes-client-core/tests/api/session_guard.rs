use crate::helpers::{no_cb, spawn_app, spawn_logged_in_app, wait_until};
use car_notes_client_core::{GuardStatus, SessionGuard};
use car_notes_shared::const_config::path::PATH_AUTH_IS_AUTHENTICATED;

#[tokio::test]
async fn logged_in_client_ready_without_request() {
    // Arrange
    let app = spawn_logged_in_app().await;
    let mut guard = SessionGuard::new();

    // Act
    let status = guard.poll(&app.core_client, no_cb);

    // Assert
    assert_eq!(status, GuardStatus::Ready);
    assert!(guard.is_ready());
    assert_eq!(
        app.backend.request_count(&PATH_AUTH_IS_AUTHENTICATED, &[]),
        0
    );
}

#[tokio::test]
async fn check_sent_once_however_often_polled() {
    // Arrange
    let app = spawn_app().await;
    let mut guard = SessionGuard::new();

    // Act
    assert_eq!(guard.poll(&app.core_client, no_cb), GuardStatus::Checking);
    assert!(!guard.is_ready());
    wait_until(|| (guard.poll(&app.core_client, no_cb) == GuardStatus::Ready).then_some(()))
        .await
        .expect("guard never became ready");
    for _ in 0..3 {
        assert_eq!(guard.poll(&app.core_client, no_cb), GuardStatus::Ready);
    }

    // Assert - Without a session the check fails and the client stays logged out
    assert_eq!(
        app.backend.request_count(&PATH_AUTH_IS_AUTHENTICATED, &[]),
        1
    );
    assert!(!app.core_client.is_logged_in());
}

#[tokio::test]
async fn authentication_check_refreshes_stored_user() {
    // Arrange
    let app = spawn_logged_in_app().await;

    // Act
    let user = app
        .core_client
        .check_authenticated(no_cb)
        .await
        .unwrap()
        .unwrap();

    // Assert
    assert_eq!(user.username, app.test_user.username);
    assert_eq!(
        app.core_client.user().unwrap().username,
        app.test_user.username
    );
    assert_eq!(
        app.backend.request_count(&PATH_AUTH_IS_AUTHENTICATED, &[]),
        1
    );
}
