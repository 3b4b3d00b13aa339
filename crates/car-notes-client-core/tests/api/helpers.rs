use car_notes_client_core::{Client, QueryState};
use car_notes_shared::errors::ApiError;

pub use car_notes_test_helper::{no_cb, wait_until, EmailKind, TestUser, PAGE_SIZE};

pub type TestApp = car_notes_test_helper::TestApp<Client>;

/// Starts a server with a client that has not talked to it yet
pub async fn spawn_app_without_csrf() -> TestApp {
    car_notes_test_helper::spawn_app(Client::new).await
}

/// Starts a server and fetches the CSRF cookie as clients do on start up
pub async fn spawn_app() -> TestApp {
    let app = spawn_app_without_csrf().await;
    fetch_csrf(&app.core_client).await;
    app
}

/// Starts a server with the test user already logged in
pub async fn spawn_logged_in_app() -> TestApp {
    let app = spawn_app().await;
    login(&app.core_client, &app.test_user).await;
    app
}

/// A second client for the same server, as if on another device
pub async fn new_client(app: &TestApp) -> Client {
    let client = Client::new(app.api_address());
    fetch_csrf(&client).await;
    client
}

pub async fn fetch_csrf(client: &Client) {
    client
        .fetch_csrf_cookie(no_cb)
        .await
        .expect("failed to receive on rx")
        .expect("failed to get csrf cookie");
}

pub async fn login(client: &Client, user: &TestUser) {
    client
        .login(&user.login_args(), no_cb)
        .await
        .expect("failed to receive on rx")
        .expect("failed to login");
}

/// Reads the query until a response has been stored
pub async fn wait_for_settled<T, F>(mut read: F) -> QueryState<T>
where
    F: FnMut() -> QueryState<T>,
{
    wait_until(|| {
        let state = read();
        (!state.is_fetching()).then_some(state)
    })
    .await
    .expect("query did not settle")
}

pub async fn wait_for_logout(client: &Client) {
    wait_until(|| (!client.is_logged_in()).then_some(()))
        .await
        .expect("client did not log out");
}

pub fn api_error(err: &anyhow::Error) -> &ApiError {
    err.downcast_ref::<ApiError>()
        .unwrap_or_else(|| panic!("expected an error response from the server but got: {err:?}"))
}
