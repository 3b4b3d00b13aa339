use std::net::TcpListener;

use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{cookie::Key, middleware::from_fn, web, App, HttpServer};
use anyhow::Context;
use tracing::info;
use tracing_actix_web::TracingLogger;

use crate::{
    backend::FakeBackend,
    middleware::{check_csrf, record_request},
    routes,
    session_state::SESSION_COOKIE_NAME,
    API_PREFIX,
};

/// Starts the server on a random port in the background and returns the port
///
/// Must be called from within a tokio runtime
pub(crate) fn start_server(backend: web::Data<FakeBackend>) -> anyhow::Result<u16> {
    let listener =
        TcpListener::bind("127.0.0.1:0").context("failed to bind to a random local port")?;
    let port = listener
        .local_addr()
        .context("failed to get local address of listener")?
        .port();
    let secret_key = Key::generate();

    let server = HttpServer::new(move || {
        // The session cookie has to work over plain http
        let session_middleware =
            SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                .cookie_name(SESSION_COOKIE_NAME.to_string())
                .cookie_secure(false)
                .build();
        App::new()
            .wrap(session_middleware)
            .wrap(from_fn(record_request))
            .wrap(TracingLogger::default())
            .service(
                web::scope(API_PREFIX)
                    .wrap(from_fn(check_csrf))
                    .configure(routes::configure),
            )
            .app_data(backend.clone())
    })
    .workers(1)
    .listen(listener)
    .context("Failed to bind HTTP Server to listener")?
    .run();

    tokio::spawn(server);
    info!(port, "fake server started");
    Ok(port)
}
