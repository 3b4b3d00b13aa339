use std::sync::Arc;

use car_notes_shared::{
    const_config::path::{
        PATH_AUTH_ACTIVATE_ACCOUNT, PATH_AUTH_CONFIRM_PASSWORD_CHANGE, PATH_AUTH_CSRF_COOKIE,
        PATH_AUTH_DELETE_ACCOUNT, PATH_AUTH_IS_AUTHENTICATED, PATH_AUTH_LOGIN, PATH_AUTH_LOGOUT,
        PATH_AUTH_LOGOUT_ALL, PATH_AUTH_REGISTER, PATH_AUTH_REQUEST_PASSWORD_CHANGE,
    },
    req_args::{
        auth::{
            ConfirmPasswordChangeReqArgs, DeleteAccountReqArgs, LoginReqArgs, RegisterReqArgs,
            RequestPasswordChangeReqArgs,
        },
        EmailLinkParams,
    },
    user::User,
};
use futures::channel::oneshot;

use crate::{
    client::{OnSuccess, UiCallBack, NO_ARGS},
    Client,
};

impl Client {
    /// Asks the server to set the CSRF cookie, needed before any other
    /// mutating request is accepted
    #[tracing::instrument(skip(ui_notify))]
    pub fn fetch_csrf_cookie<F: UiCallBack>(
        &self,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_request_expect_empty(
            PATH_AUTH_CSRF_COOKIE,
            &[],
            NO_ARGS,
            OnSuccess::Nothing,
            ui_notify,
        )
    }

    /// Checks if the server still has a session for this client
    ///
    /// On success the user is stored in the session store. On any failure
    /// the session is ended as with [`Self::logout_no_wait`].
    #[tracing::instrument(skip(ui_notify))]
    pub fn check_authenticated<F: UiCallBack>(
        &self,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<Arc<User>>> {
        self.send_request_expect_user(PATH_AUTH_IS_AUTHENTICATED, NO_ARGS, true, ui_notify)
    }

    /// Returns the message from the server to show the user (activation email
    /// sent)
    #[tracing::instrument(skip(ui_notify))]
    pub fn register<F: UiCallBack>(
        &self,
        args: &RegisterReqArgs,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<String>> {
        self.send_request_expect_json(
            PATH_AUTH_REGISTER,
            &[],
            Some(args),
            OnSuccess::Nothing,
            ui_notify,
        )
    }

    #[tracing::instrument(skip(ui_notify))]
    pub fn activate_account<F: UiCallBack>(
        &self,
        link: &EmailLinkParams,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<String>> {
        self.send_request_expect_json(
            PATH_AUTH_ACTIVATE_ACCOUNT,
            &link.as_path_params(),
            NO_ARGS,
            OnSuccess::Nothing,
            ui_notify,
        )
    }

    #[tracing::instrument(skip(ui_notify))]
    pub fn login<F: UiCallBack>(
        &self,
        args: &LoginReqArgs,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<Arc<User>>> {
        self.send_request_expect_user(PATH_AUTH_LOGIN, Some(args), false, ui_notify)
    }

    #[tracing::instrument(skip(ui_notify))]
    pub fn logout<F: UiCallBack>(&self, ui_notify: F) -> oneshot::Receiver<anyhow::Result<()>> {
        self.end_session(); // Clear session even if logout fails
        self.send_request_expect_empty(
            PATH_AUTH_LOGOUT,
            &[],
            NO_ARGS,
            OnSuccess::Nothing,
            ui_notify,
        )
    }

    /// Ends every session of the user, on all devices
    #[tracing::instrument(skip(ui_notify))]
    pub fn logout_all_devices<F: UiCallBack>(
        &self,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.end_session(); // Clear session even if logout fails
        self.send_request_expect_empty(
            PATH_AUTH_LOGOUT_ALL,
            &[],
            NO_ARGS,
            OnSuccess::Nothing,
            ui_notify,
        )
    }

    /// Ends the session once the server confirms the account was deleted
    #[tracing::instrument(skip(ui_notify))]
    pub fn delete_account<F: UiCallBack>(
        &self,
        args: &DeleteAccountReqArgs,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_request_expect_empty(
            PATH_AUTH_DELETE_ACCOUNT,
            &[],
            Some(args),
            OnSuccess::EndSession,
            ui_notify,
        )
    }

    /// Sends an email with a link to set a new password
    #[tracing::instrument(skip(ui_notify))]
    pub fn request_password_change<F: UiCallBack>(
        &self,
        args: &RequestPasswordChangeReqArgs,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<String>> {
        self.send_request_expect_json(
            PATH_AUTH_REQUEST_PASSWORD_CHANGE,
            &[],
            Some(args),
            OnSuccess::Nothing,
            ui_notify,
        )
    }

    /// Sets a new password using the parameters from the emailed link
    #[tracing::instrument(skip(ui_notify))]
    pub fn confirm_password_change<F: UiCallBack>(
        &self,
        args: &ConfirmPasswordChangeReqArgs,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<String>> {
        self.send_request_expect_json(
            PATH_AUTH_CONFIRM_PASSWORD_CHANGE,
            &args.link.as_path_params(),
            Some(args),
            OnSuccess::Nothing,
            ui_notify,
        )
    }
}
