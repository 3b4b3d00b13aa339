use crate::helpers::{
    api_error, login, new_client, no_cb, spawn_app, spawn_app_without_csrf, spawn_logged_in_app,
    wait_for_logout, wait_for_settled, EmailKind,
};
use car_notes_shared::{
    const_config::path::{PATH_AUTH_IS_AUTHENTICATED, PATH_AUTH_LOGIN},
    errors::ErrorBody,
    list_query::CarListQuery,
    req_args::{
        auth::{
            ConfirmPasswordChangeReqArgs, DeleteAccountReqArgs, LoginReqArgs, RegisterReqArgs,
            RequestPasswordChangeReqArgs,
        },
        EmailLinkParams,
    },
};
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn login_logout_round_trip() {
    // Arrange
    let app = spawn_app().await;

    // Assert - Ensure not logged in
    assert!(!app.core_client.is_logged_in());

    // Act - Login
    let user = app
        .core_client
        .login(&app.test_user.login_args(), no_cb)
        .await
        .unwrap()
        .unwrap();

    // Assert - Login successful and user stored
    assert_eq!(user.username, app.test_user.username);
    assert_eq!(
        app.core_client.user().unwrap().username,
        app.test_user.username
    );
    assert!(app
        .core_client
        .check_authenticated(no_cb)
        .await
        .unwrap()
        .is_ok());

    // Act - Logout
    app.core_client.logout(no_cb).await.unwrap().unwrap();

    // Assert - Ensure we are not logged in on either side
    assert!(!app.core_client.is_logged_in());
    assert!(app
        .core_client
        .check_authenticated(no_cb)
        .await
        .unwrap()
        .is_err());
}

#[tokio::test]
async fn login_failure_reports_server_message() {
    // Arrange
    let app = spawn_app().await;
    let login_args = LoginReqArgs::new(
        app.test_user.email.clone(),
        "random-password".to_string().into(),
    );

    // Act
    let outcome = app.core_client.login(&login_args, no_cb).await.unwrap();

    // Assert
    let err = outcome.unwrap_err();
    let api_error = api_error(&err);
    assert_eq!(api_error.status, 400);
    assert_eq!(api_error.body, ErrorBody::Detail("Could not log in.".into()));
    assert!(!app.core_client.is_logged_in());
}

#[tokio::test]
async fn ensure_call_back_is_run() {
    // Arrange
    let app = spawn_app().await;
    let test_flag = Arc::new(Mutex::new(false));
    let test_flag_clone = Arc::clone(&test_flag);

    // Act
    app.core_client
        .login(&app.test_user.login_args(), move || {
            *test_flag_clone.lock().unwrap() = true;
        })
        .await
        .expect("failed to receive from rx")
        .expect("failed to get result of login");

    // Assert
    assert!(*test_flag.lock().unwrap(), "flag was not flipped");
}

#[tokio::test]
async fn csrf_token_echoed_in_header() {
    // Arrange
    let app = spawn_app().await;
    let token = app.core_client.csrf_token().expect("csrf cookie not set");

    // Act
    login(&app.core_client, &app.test_user).await;

    // Assert
    let requests = app.backend.requests_to(&PATH_AUTH_LOGIN, &[]);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].csrf_header.as_deref(), Some(token.as_str()));
}

#[tokio::test]
async fn mutating_request_without_csrf_cookie_rejected() {
    // Arrange
    let app = spawn_app_without_csrf().await;

    // Act
    let outcome = app
        .core_client
        .login(&app.test_user.login_args(), no_cb)
        .await
        .unwrap();

    // Assert
    assert_eq!(api_error(&outcome.unwrap_err()).status, 403);
    assert!(app.backend.requests_to(&PATH_AUTH_LOGIN, &[])[0]
        .csrf_header
        .is_none());
    assert!(!app.core_client.is_logged_in());
}

#[tokio::test]
async fn failed_authentication_check_does_not_recurse() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let outcome = app.core_client.check_authenticated(no_cb).await.unwrap();

    // Assert
    assert_eq!(api_error(&outcome.unwrap_err()).status, 401);
    assert_eq!(
        app.backend.request_count(&PATH_AUTH_IS_AUTHENTICATED, &[]),
        1
    );
}

#[tokio::test]
async fn register_activate_login() {
    // Arrange
    let app = spawn_app().await;
    let email = "new-user@example.com";
    let args = RegisterReqArgs::new(
        "new-user",
        email,
        "a-password".to_string().into(),
        "a-password".to_string().into(),
    );
    let login_args = LoginReqArgs::new(email, "a-password".to_string().into());

    // Act - Register
    let msg = app.core_client.register(&args, no_cb).await.unwrap().unwrap();

    // Assert - Not able to login before activation
    assert_eq!(msg, "Please check your email to activate your account.");
    assert!(app
        .core_client
        .login(&login_args, no_cb)
        .await
        .unwrap()
        .is_err());

    // Act - Activate with the emailed link
    let link = app
        .backend
        .last_link_sent_to(email, EmailKind::Activation)
        .expect("activation email not sent");
    let msg = app
        .core_client
        .activate_account(&link, no_cb)
        .await
        .unwrap()
        .unwrap();

    // Assert - Now able to login
    assert_eq!(msg, "Account activated successfully!");
    let user = app
        .core_client
        .login(&login_args, no_cb)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.username, "new-user");
}

#[tokio::test]
async fn register_password_mismatch_reported_for_field() {
    // Arrange
    let app = spawn_app().await;
    let args = RegisterReqArgs::new(
        "new-user",
        "new-user@example.com",
        "a-password".to_string().into(),
        "another-password".to_string().into(),
    );

    // Act
    let outcome = app.core_client.register(&args, no_cb).await.unwrap();

    // Assert
    let err = outcome.unwrap_err();
    assert_eq!(
        api_error(&err).body.field("password"),
        Some(["Passwords do not match.".to_string()].as_slice())
    );
    assert!(app.backend.sent_emails().is_empty());
}

#[tokio::test]
async fn activation_with_invalid_link_fails() {
    // Arrange
    let app = spawn_app().await;
    let link = EmailLinkParams::new(app.test_user.id.to_string(), "not-a-token".to_string());

    // Act
    let outcome = app
        .core_client
        .activate_account(&link, no_cb)
        .await
        .unwrap();

    // Assert
    let err = outcome.unwrap_err();
    assert_eq!(
        api_error(&err).body,
        ErrorBody::Detail("Account Activation Failed.".into())
    );
}

#[tokio::test]
async fn forgotten_password_round_trip() {
    // Arrange
    let app = spawn_app().await;
    let new_password = "the-new-password".to_string();

    // Act - Request link
    let msg = app
        .core_client
        .request_password_change(
            &RequestPasswordChangeReqArgs::new(app.test_user.email.clone()),
            no_cb,
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(msg, "Please check your email to recover your password.");

    // Act - Set new password using the emailed link
    let link = app
        .backend
        .last_link_sent_to(&app.test_user.email, EmailKind::PasswordChange)
        .expect("password change email not sent");
    let args = ConfirmPasswordChangeReqArgs::new(
        link,
        new_password.clone().into(),
        new_password.clone().into(),
    );
    app.core_client
        .confirm_password_change(&args, no_cb)
        .await
        .unwrap()
        .unwrap();

    // Assert - Only the new password works
    assert!(app
        .core_client
        .login(&app.test_user.login_args(), no_cb)
        .await
        .unwrap()
        .is_err());
    let login_args = LoginReqArgs::new(app.test_user.email.clone(), new_password.into());
    assert!(app
        .core_client
        .login(&login_args, no_cb)
        .await
        .unwrap()
        .is_ok());
}

#[tokio::test]
async fn password_change_request_for_unknown_email_still_succeeds() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let outcome = app
        .core_client
        .request_password_change(
            &RequestPasswordChangeReqArgs::new("nobody@example.com"),
            no_cb,
        )
        .await
        .unwrap();

    // Assert
    assert!(outcome.is_ok());
    assert!(app.backend.sent_emails().is_empty());
}

#[tokio::test]
async fn delete_account_with_wrong_password_keeps_session() {
    // Arrange
    let app = spawn_logged_in_app().await;
    let args = DeleteAccountReqArgs::new("wrong-password".to_string().into());

    // Act
    let outcome = app.core_client.delete_account(&args, no_cb).await.unwrap();

    // Assert
    let err = outcome.unwrap_err();
    assert_eq!(
        api_error(&err).body.field("password"),
        Some(["Wrong password.".to_string()].as_slice())
    );
    assert!(app.core_client.is_logged_in());
    assert!(app.backend.user_exists(app.test_user.id));
}

#[tokio::test]
async fn delete_account_ends_session() {
    // Arrange
    let app = spawn_logged_in_app().await;
    wait_for_settled(|| app.core_client.cars(&CarListQuery::new(), no_cb)).await;
    let args = DeleteAccountReqArgs::new(app.test_user.password.clone().into());

    // Act
    app.core_client
        .delete_account(&args, no_cb)
        .await
        .unwrap()
        .unwrap();

    // Assert
    assert!(!app.core_client.is_logged_in());
    assert!(app.core_client.is_cache_empty());
    assert!(!app.backend.user_exists(app.test_user.id));
}

#[tokio::test]
async fn logout_purges_cached_queries() {
    // Arrange
    let app = spawn_logged_in_app().await;
    wait_for_settled(|| app.core_client.cars(&CarListQuery::new(), no_cb)).await;
    assert!(!app.core_client.is_cache_empty());

    // Act
    app.core_client.logout(no_cb).await.unwrap().unwrap();

    // Assert
    assert!(app.core_client.is_cache_empty());
}

#[tokio::test]
async fn logout_all_devices_ends_other_sessions() {
    // Arrange
    let app = spawn_logged_in_app().await;
    let other_device = new_client(&app).await;
    login(&other_device, &app.test_user).await;

    // Act
    app.core_client
        .logout_all_devices(no_cb)
        .await
        .unwrap()
        .unwrap();

    // Assert - The next request of the other device is rejected which ends
    // its session too
    assert!(!app.core_client.is_logged_in());
    assert!(other_device.is_logged_in());
    let _ = other_device.cars(&CarListQuery::new(), no_cb);
    wait_for_logout(&other_device).await;
    assert!(other_device.is_cache_empty());
}

#[tokio::test]
async fn unauthorized_response_ends_session() {
    // Arrange
    let app = spawn_logged_in_app().await;
    let other_device = new_client(&app).await;
    login(&other_device, &app.test_user).await;
    let _ = wait_for_settled(|| other_device.car_filter_options(no_cb)).await;
    app.backend.reject_unauthenticated_with_401();
    app.core_client
        .logout_all_devices(no_cb)
        .await
        .unwrap()
        .unwrap();
    assert!(!other_device.is_cache_empty());

    // Act - The rejected request is answered with 401
    let _ = other_device.cars(&CarListQuery::new(), no_cb);

    // Assert
    wait_for_logout(&other_device).await;
    assert!(other_device.is_cache_empty());
    let outcome = other_device.delete_car(1.into(), no_cb).await.unwrap();
    assert_eq!(api_error(&outcome.unwrap_err()).status, 401);
}
