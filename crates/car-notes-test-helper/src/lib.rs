//! Provides supporting code for running integration tests against an in
//! memory stand in for the car notes server
//!
//! The fake server follows the same contract as the real one: session and
//! CSRF cookies, `X-CSRFToken` on every mutating request, 403 when either is
//! missing and the same response bodies.

#![warn(unused_crate_dependencies)]

use actix_web::web;
use anyhow::bail;
use car_notes_shared::{
    id::DbId,
    req_args::auth::LoginReqArgs,
    telemetry::{init_subscriber, json_subscriber, TraceFile, TEST_SERVER_FILTER},
};
use std::fmt::Debug;
use std::ops::Deref;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use uuid::Uuid;

mod backend;
mod errors;
mod middleware;
mod routes;
mod session_state;
mod startup;

pub use backend::{EmailKind, FakeBackend, RecordedRequest, SentEmail, PAGE_SIZE};

/// All endpoints are served below this path
pub const API_PREFIX: &str = "/api";

const MSG_WAIT_TIMEOUT: Duration = Duration::from_secs(2);

const TRACE_APP_NAME: &str = "car-notes-tests";

// Ensure that the `tracing` stack is only initialised once
pub static TRACING: LazyLock<String> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let trace = TraceFile::create(TRACE_APP_NAME).unwrap();
        let subscriber = json_subscriber(TRACE_APP_NAME, TEST_SERVER_FILTER, trace.file);
        init_subscriber(subscriber).unwrap();
        format!("Traces for tests being written to: {:?}", trace.path)
    } else {
        let subscriber = json_subscriber(TRACE_APP_NAME, TEST_SERVER_FILTER, std::io::sink);
        init_subscriber(subscriber).unwrap();
        "Traces set to std::io::sink".to_string()
    }
});

pub struct TestApp<C> {
    /// Address of the server without the [`API_PREFIX`]
    pub address: String,
    pub backend: web::Data<FakeBackend>,
    /// An active user that is not staff
    pub test_user: TestUser,
    pub core_client: C,
}

impl<C> Debug for TestApp<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestApp")
            .field("address", &self.address)
            .field("test_user", &self.test_user)
            .finish()
    }
}

impl<C> TestApp<C> {
    /// The address clients should be given
    pub fn api_address(&self) -> String {
        format!("{}{API_PREFIX}", self.address)
    }
}

/// Empty function for use when a call back isn't needed
pub fn no_cb() {}

/// Starts a fresh server with one normal user and builds the client under
/// test with the address to use
pub async fn spawn_app<C, F>(build_client: F) -> TestApp<C>
where
    F: FnOnce(String) -> C,
{
    start_tracing();
    let backend = web::Data::new(FakeBackend::default());
    let port = startup::start_server(backend.clone()).expect("failed to start fake server");
    let address = port_to_test_address(port);
    let test_user = TestUser::create(&backend, "normal", false);
    let core_client = build_client(format!("{address}{API_PREFIX}"));
    TestApp {
        address,
        backend,
        test_user,
        core_client,
    }
}

pub fn port_to_test_address(application_port: u16) -> String {
    format!("http://127.0.0.1:{application_port}")
}

fn start_tracing() {
    // Accessing TRACING also forces the LazyLock to initialize
    let logging_msg = TRACING.deref();
    println!("{logging_msg}");
}

#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl TestUser {
    /// Stores a new active user with random credentials on the server
    pub fn create(backend: &FakeBackend, username_prefix: &str, is_staff: bool) -> Self {
        let username = format!("{username_prefix}-{}", &Uuid::new_v4().to_string()[..8]);
        let email = format!("{username}@example.com");
        let password = Uuid::new_v4().to_string();
        let user = backend.add_user(&username, &email, &password, is_staff, true);
        Self {
            id: user.id,
            username,
            email,
            password,
        }
    }

    pub fn login_args(&self) -> LoginReqArgs {
        LoginReqArgs::new(self.email.clone(), self.password.clone().into())
    }
}

/// Polls until `poll` returns a value or the timeout is reached
pub async fn wait_until<T, F>(mut poll: F) -> anyhow::Result<T>
where
    F: FnMut() -> Option<T>,
{
    let start = Instant::now();
    while start.elapsed() < MSG_WAIT_TIMEOUT {
        if let Some(value) = poll() {
            return Ok(value);
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    bail!("Timed out after {MSG_WAIT_TIMEOUT:?}")
}
