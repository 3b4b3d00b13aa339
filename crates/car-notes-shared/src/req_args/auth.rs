use std::fmt::Debug;

use secrecy::{ExposeSecret, SecretString};

use crate::{errors::ErrorBody, req_args::EmailLinkParams};

const MSG_REQUIRED: &str = "This field is required.";
const MSG_PASSWORD_MISMATCH: &str = "Passwords do not match.";

#[derive(Clone)]
pub struct LoginReqArgs {
    pub email: String,
    pub password: SecretString,
}

#[derive(Clone)]
pub struct RegisterReqArgs {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

#[derive(Clone)]
pub struct DeleteAccountReqArgs {
    pub password: SecretString,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RequestPasswordChangeReqArgs {
    pub email: String,
}

#[derive(Clone)]
pub struct ConfirmPasswordChangeReqArgs {
    pub link: EmailLinkParams,
    pub new_password: SecretString,
    pub new_password_confirm: SecretString,
}

#[derive(serde::Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
    confirm_password: &'a str,
}

#[derive(serde::Serialize)]
struct DeleteAccountBody<'a> {
    password: &'a str,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfirmPasswordChangeBody<'a> {
    new_password: &'a str,
    new_password_confirm: &'a str,
}

impl LoginReqArgs {
    pub fn new<S: Into<String>>(email: S, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }
}

impl RegisterReqArgs {
    pub fn new<S: Into<String>>(
        username: S,
        email: S,
        password: SecretString,
        confirm_password: SecretString,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password,
            confirm_password,
        }
    }

    /// Checks what can be checked before sending, in the same shape the
    /// server reports validation errors in
    pub fn validate(&self) -> Result<(), ErrorBody> {
        let mut errors = ErrorBody::Empty;
        for (name, is_blank) in [
            ("username", self.username.trim().is_empty()),
            ("email", self.email.trim().is_empty()),
            ("password", self.password.expose_secret().is_empty()),
            (
                "confirmPassword",
                self.confirm_password.expose_secret().is_empty(),
            ),
        ] {
            if is_blank {
                errors.push_field_error(name, MSG_REQUIRED);
            }
        }
        if self.password.expose_secret() != self.confirm_password.expose_secret() {
            errors.push_field_error("password", MSG_PASSWORD_MISMATCH);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl DeleteAccountReqArgs {
    pub fn new(password: SecretString) -> Self {
        Self { password }
    }
}

impl RequestPasswordChangeReqArgs {
    pub fn new<S: Into<String>>(email: S) -> Self {
        Self {
            email: email.into(),
        }
    }
}

impl ConfirmPasswordChangeReqArgs {
    pub fn new(
        link: EmailLinkParams,
        new_password: SecretString,
        new_password_confirm: SecretString,
    ) -> Self {
        Self {
            link,
            new_password,
            new_password_confirm,
        }
    }

    pub fn validate(&self) -> Result<(), ErrorBody> {
        let mut errors = ErrorBody::Empty;
        if self.new_password.expose_secret().is_empty() {
            errors.push_field_error("newPassword", MSG_REQUIRED);
        }
        if self.new_password.expose_secret() != self.new_password_confirm.expose_secret() {
            errors.push_field_error("newPassword", MSG_PASSWORD_MISMATCH);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl serde::Serialize for LoginReqArgs {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        LoginBody {
            email: &self.email,
            password: self.password.expose_secret(),
        }
        .serialize(serializer)
    }
}

impl serde::Serialize for RegisterReqArgs {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RegisterBody {
            username: &self.username,
            email: &self.email,
            password: self.password.expose_secret(),
            confirm_password: self.confirm_password.expose_secret(),
        }
        .serialize(serializer)
    }
}

impl serde::Serialize for DeleteAccountReqArgs {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DeleteAccountBody {
            password: self.password.expose_secret(),
        }
        .serialize(serializer)
    }
}

/// Only the passwords go in the body, the link parameters are part of the path
impl serde::Serialize for ConfirmPasswordChangeReqArgs {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ConfirmPasswordChangeBody {
            new_password: self.new_password.expose_secret(),
            new_password_confirm: self.new_password_confirm.expose_secret(),
        }
        .serialize(serializer)
    }
}

impl Debug for LoginReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginReqArgs")
            .field("email", &self.email)
            .field("has_password", &!self.password.expose_secret().is_empty())
            .finish()
    }
}

impl Debug for RegisterReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterReqArgs")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("has_password", &!self.password.expose_secret().is_empty())
            .finish()
    }
}

impl Debug for DeleteAccountReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeleteAccountReqArgs")
            .field("has_password", &!self.password.expose_secret().is_empty())
            .finish()
    }
}

impl Debug for ConfirmPasswordChangeReqArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmPasswordChangeReqArgs")
            .field("link", &self.link)
            .field(
                "has_password",
                &!self.new_password.expose_secret().is_empty(),
            )
            .finish()
    }
}
