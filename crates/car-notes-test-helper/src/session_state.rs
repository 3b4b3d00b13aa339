use actix_session::{Session, SessionExt, SessionGetError, SessionInsertError};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use anyhow::Context;
use car_notes_shared::{id::DbId, user::User};
use std::future::{ready, Ready};

use crate::{backend::FakeBackend, errors::BackendError};

/// Name of the cookie holding the session, same as on the real server
pub const SESSION_COOKIE_NAME: &str = "sessionid";

/// What is kept in the session cookie
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub(crate) struct SessionInfo {
    pub user_id: DbId,
    /// Compared against the user's current generation to support ending
    /// all sessions
    pub generation: u64,
}

pub struct TypedSession(Session);

impl TypedSession {
    const SESSION_INFO_KEY: &'static str = "session_info";

    pub fn renew(&self) {
        self.0.renew();
    }

    pub(crate) fn insert_session_info(&self, info: SessionInfo) -> Result<(), SessionInsertError> {
        self.0.insert(Self::SESSION_INFO_KEY, info)
    }

    pub(crate) fn get_session_info(&self) -> Result<Option<SessionInfo>, SessionGetError> {
        self.0.get(Self::SESSION_INFO_KEY)
    }

    pub fn log_out(self) {
        self.0.purge()
    }
}

impl FromRequest for TypedSession {
    type Error = <Session as FromRequest>::Error;
    type Future = Ready<Result<TypedSession, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(TypedSession(req.get_session())))
    }
}

/// The user of a valid session
///
/// Extracting it rejects the request with a 403 (or 401 if so configured) if
/// there is none
pub(crate) struct LoggedInUser(pub User);

impl FromRequest for LoggedInUser {
    type Error = BackendError;
    type Future = Ready<Result<LoggedInUser, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(logged_in_user(req))
    }
}

fn logged_in_user(req: &HttpRequest) -> Result<LoggedInUser, BackendError> {
    let backend = req
        .app_data::<web::Data<FakeBackend>>()
        .context("backend not found in app data")?;
    let session = TypedSession(req.get_session());
    let info = session
        .get_session_info()
        .context("failed to read session")?;
    info.and_then(|info| backend.session_user(&info))
        .map(LoggedInUser)
        .ok_or_else(|| backend.not_authenticated())
}
