use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::Method,
    middleware::Next,
    web,
};
use car_notes_shared::const_config::{
    csrf::{CSRF_COOKIE_NAME, CSRF_HEADER_NAME},
    path::PATH_AUTH_CSRF_COOKIE,
};
use tracing::warn;

use crate::{
    backend::{FakeBackend, RecordedRequest},
    errors::BackendError,
    API_PREFIX,
};

/// Keeps every request so tests can check what the client sent
pub(crate) async fn record_request(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    if let Some(backend) = req.app_data::<web::Data<FakeBackend>>() {
        backend.record_request(RecordedRequest {
            method: req.method().to_string(),
            path: strip_api_prefix(req.path()).to_string(),
            query: req.query_string().to_string(),
            csrf_header: header_value(&req, CSRF_HEADER_NAME),
        });
    }
    next.call(req).await
}

/// Mutating requests must echo the value of the CSRF cookie in the header
///
/// The request that sets the cookie is exempt
#[tracing::instrument(skip_all, fields(path = req.path()))]
pub(crate) async fn check_csrf(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let is_exempt =
        req.method() == Method::GET || strip_api_prefix(req.path()) == PATH_AUTH_CSRF_COOKIE.path;
    if !is_exempt {
        let cookie = req.cookie(CSRF_COOKIE_NAME).map(|x| x.value().to_string());
        let header = header_value(&req, CSRF_HEADER_NAME);
        match (cookie, header) {
            (Some(cookie), Some(header)) if cookie == header => {}
            (cookie, header) => {
                warn!(
                    has_cookie = cookie.is_some(),
                    has_header = header.is_some(),
                    "CSRF check failed"
                );
                return Err(BackendError::CsrfFailed.into());
            }
        }
    }
    next.call(req).await
}

fn strip_api_prefix(path: &str) -> &str {
    path.strip_prefix(API_PREFIX).unwrap_or(path)
}

fn header_value(req: &ServiceRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|x| x.to_str().ok())
        .map(|x| x.to_string())
}
