use actix_web::{cookie::Cookie, web, HttpRequest, HttpResponse};
use anyhow::Context;
use car_notes_shared::{
    const_config::csrf::CSRF_COOKIE_NAME, errors::ErrorBody, req_args::EmailLinkParams,
    user::UserEnvelope,
};
use uuid::Uuid;

use crate::{
    backend::FakeBackend,
    errors::BackendError,
    session_state::{LoggedInUser, TypedSession},
};

const MSG_REQUIRED: &str = "This field is required.";

#[derive(serde::Deserialize)]
pub(crate) struct LoginBody {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    confirm_password: String,
}

#[derive(serde::Deserialize)]
pub(crate) struct DeleteAccountBody {
    #[serde(default)]
    password: String,
}

#[derive(serde::Deserialize)]
pub(crate) struct RequestPasswordChangeBody {
    #[serde(default)]
    email: String,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConfirmPasswordChangeBody {
    #[serde(default)]
    new_password: String,
    #[serde(default)]
    new_password_confirm: String,
}

/// Sets the CSRF cookie unless the client already has one
#[tracing::instrument(skip_all)]
pub(crate) async fn csrf_cookie(req: HttpRequest) -> HttpResponse {
    let mut response = HttpResponse::Ok();
    if req.cookie(CSRF_COOKIE_NAME).is_none() {
        response.cookie(
            Cookie::build(CSRF_COOKIE_NAME, Uuid::new_v4().simple().to_string())
                .path("/")
                .finish(),
        );
    }
    response.finish()
}

/// Unlike the other endpoints a missing session is reported as 401
#[tracing::instrument(skip_all)]
pub(crate) async fn is_authenticated(user: Option<LoggedInUser>) -> HttpResponse {
    match user {
        Some(LoggedInUser(user)) => HttpResponse::Ok().json(UserEnvelope { user }),
        None => HttpResponse::Unauthorized().finish(),
    }
}

#[tracing::instrument(skip_all)]
pub(crate) async fn register(
    web::Json(body): web::Json<RegisterBody>,
    backend: web::Data<FakeBackend>,
) -> Result<HttpResponse, BackendError> {
    let mut errors = required_fields([
        ("username", &body.username),
        ("email", &body.email),
        ("password", &body.password),
        ("confirm_password", &body.confirm_password),
    ]);
    if errors.is_empty() && body.password != body.confirm_password {
        errors.push_field_error("password", "Passwords do not match.");
    }
    if !errors.is_empty() {
        return Err(errors.into());
    }
    backend.register(&body.username, &body.email, &body.password)?;
    Ok(HttpResponse::Created().json("Please check your email to activate your account."))
}

#[tracing::instrument(skip(backend))]
pub(crate) async fn activate_account(
    path: web::Path<(String, String)>,
    backend: web::Data<FakeBackend>,
) -> Result<HttpResponse, BackendError> {
    let (uid, token) = path.into_inner();
    if backend.activate(&EmailLinkParams::new(uid, token)) {
        Ok(HttpResponse::Ok().json("Account activated successfully!"))
    } else {
        Err(BackendError::BadRequest(
            "Account Activation Failed.".to_string(),
        ))
    }
}

#[tracing::instrument(skip_all, fields(email = tracing::field::Empty))]
pub(crate) async fn login(
    web::Json(body): web::Json<LoginBody>,
    backend: web::Data<FakeBackend>,
    session: TypedSession,
) -> Result<HttpResponse, BackendError> {
    tracing::Span::current().record("email", tracing::field::display(&body.email));
    let Some((user, info)) = backend.login(&body.email, &body.password) else {
        return Err(BackendError::BadRequest("Could not log in.".to_string()));
    };
    session.renew();
    session
        .insert_session_info(info)
        .context("session update failed")?;
    Ok(HttpResponse::Ok().json(UserEnvelope { user }))
}

#[tracing::instrument(skip_all)]
pub(crate) async fn logout(_user: LoggedInUser, session: TypedSession) -> HttpResponse {
    session.log_out();
    HttpResponse::NoContent().finish()
}

#[tracing::instrument(skip_all)]
pub(crate) async fn logout_all(
    LoggedInUser(user): LoggedInUser,
    session: TypedSession,
    backend: web::Data<FakeBackend>,
) -> HttpResponse {
    backend.end_all_sessions(user.id);
    session.log_out();
    HttpResponse::NoContent().finish()
}

#[tracing::instrument(skip_all)]
pub(crate) async fn delete_account(
    LoggedInUser(user): LoggedInUser,
    session: TypedSession,
    web::Json(body): web::Json<DeleteAccountBody>,
    backend: web::Data<FakeBackend>,
) -> Result<HttpResponse, BackendError> {
    if body.password.is_empty() {
        return Err(BackendError::field("password", MSG_REQUIRED));
    }
    backend.delete_account(user.id, &body.password)?;
    session.log_out();
    Ok(HttpResponse::NoContent().finish())
}

/// Always reports success so it cannot be used to find registered emails
#[tracing::instrument(skip_all)]
pub(crate) async fn request_password_change(
    web::Json(body): web::Json<RequestPasswordChangeBody>,
    backend: web::Data<FakeBackend>,
) -> Result<HttpResponse, BackendError> {
    let errors = required_fields([("email", &body.email)]);
    if !errors.is_empty() {
        return Err(errors.into());
    }
    backend.request_password_change(&body.email);
    Ok(HttpResponse::Ok().json("Please check your email to recover your password."))
}

/// The link is checked before the new password
#[tracing::instrument(skip(body, backend))]
pub(crate) async fn confirm_password_change(
    path: web::Path<(String, String)>,
    web::Json(body): web::Json<ConfirmPasswordChangeBody>,
    backend: web::Data<FakeBackend>,
) -> Result<HttpResponse, BackendError> {
    let (uid, token) = path.into_inner();
    let link = EmailLinkParams::new(uid, token);
    let link_failed = || BackendError::BadRequest("Password reset failed.".to_string());
    if !backend.is_valid_link(&link) {
        return Err(link_failed());
    }
    let mut errors = required_fields([
        ("newPassword", &body.new_password),
        ("newPasswordConfirm", &body.new_password_confirm),
    ]);
    if errors.is_empty() && body.new_password != body.new_password_confirm {
        errors.push_field_error("password", "New passwords do not match.");
    }
    if !errors.is_empty() {
        return Err(errors.into());
    }
    if backend.change_password(&link, &body.new_password) {
        Ok(HttpResponse::Ok().json("Password reset was successful!"))
    } else {
        Err(link_failed())
    }
}

fn required_fields<const N: usize>(fields: [(&str, &String); N]) -> ErrorBody {
    let mut errors = ErrorBody::Empty;
    for (name, value) in fields {
        if value.trim().is_empty() {
            errors.push_field_error(name, MSG_REQUIRED);
        }
    }
    errors
}
