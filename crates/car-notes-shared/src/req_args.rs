//! This module stores the expected format of the arguments for the requests.
//! The structure of the module is supposed to match the path of the endpoints.
//! For example `/auth/login/` maps to [`auth::LoginReqArgs`]. The body for
//! `/cars/` is [`crate::car::CarFields`].
//!
//! Types holding passwords implement [`serde::Serialize`] by hand so the
//! secret is only exposed while the body is being written

pub mod auth;

/// Path parameters of the links sent by email (account activation and
/// forgotten password)
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EmailLinkParams {
    pub uid: String,
    pub token: String,
}

impl EmailLinkParams {
    pub fn new<S: Into<String>>(uid: S, token: S) -> Self {
        Self {
            uid: uid.into(),
            token: token.into(),
        }
    }

    /// For use with [`crate::const_config::path::PathSpec::with_params`]
    pub fn as_path_params(&self) -> [(&str, &str); 2] {
        [("uid", self.uid.as_str()), ("token", self.token.as_str())]
    }
}
