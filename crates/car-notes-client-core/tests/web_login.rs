//! IMPORTANT!!!
//! A car notes server must be started up on localhost separately (Will not
//! work in CI). Only intended for local testing. Expects a user with the
//! credentials below to exist and be active. Then from the folder
//! "crates/car-notes-client-core" run one of the following to execute the
//! tests
//! - `wasm-pack test --headless --firefox`
//! - `wasm-pack test --headless --chrome`
use car_notes_client_core::Client;
use car_notes_shared::req_args::auth::LoginReqArgs;
use wasm_bindgen_test::wasm_bindgen_test;
use wasm_bindgen_test::wasm_bindgen_test_configure;

wasm_bindgen_test_configure!(run_in_browser);
fn main() {
    #[wasm_bindgen_test]
    async fn login_logout_round_trip() {
        // Arrange
        // ASSUMING SERVER HAS BEEN STARTED (See module docs comment)
        let client = Client::default();
        let login_args =
            LoginReqArgs::new("seed_user@example.com", "seed-password".to_string().into());

        // Act - Get the CSRF cookie as the app does on start up
        client
            .fetch_csrf_cookie(no_cb)
            .await
            .expect("failed to receive on rx")
            .expect("IMPORTANT!!! ensure server is started properly see module doc comment");

        // Assert - Ensure not logged in
        assert!(!client.is_logged_in());

        // Act - Login
        let user = client
            .login(&login_args, no_cb)
            .await
            .expect("failed to receive on rx")
            .expect("failed to login");

        // Assert - Login successful and user stored
        assert_eq!(client.user().unwrap().username, user.username);

        // Act - Logout
        client
            .logout(no_cb)
            .await
            .expect("failed to receive on rx")
            .expect("failed to logout");

        // Assert
        assert!(!client.is_logged_in());
        assert!(client.is_cache_empty());
    }
}

fn no_cb() {}
