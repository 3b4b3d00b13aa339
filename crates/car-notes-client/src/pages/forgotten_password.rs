//! Changing the password without being logged in, using a link sent by email

use car_notes_shared::req_args::{
    auth::{ConfirmPasswordChangeReqArgs, RequestPasswordChangeReqArgs},
    EmailLinkParams,
};
use secrecy::SecretString;

use super::{
    data_state::{AwaitingType, DataState},
    ui_request_errors, DisplayablePage,
};
use crate::{
    app::wake_fn,
    routes::Route,
    ui_helpers::{submitted, ui_field_errors, ui_password_edit, ui_text_field},
    DataShared,
};

#[derive(Debug, Default)]
pub struct UiRequestPasswordChange {
    email: String,
    data_state: DataState<String>,
}

#[derive(Debug)]
pub struct UiConfirmPasswordChange {
    link: EmailLinkParams,
    new_password: SecretString,
    new_password_confirm: SecretString,
    data_state: DataState<String>,
}

impl DisplayablePage for UiRequestPasswordChange {
    fn title(&self) -> String {
        "Change Password".to_string()
    }

    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        ui.vertical_centered(|ui| {
            self.data_state.poll(Some(&mut *ui));
            if let DataState::Present(msg) = &self.data_state {
                ui.label(msg);
                return;
            }

            if self.email.is_empty() {
                if let Some(email) = data_shared.user().and_then(|u| u.email.clone()) {
                    self.email = email;
                }
            }
            ui.label("A link to set a new password will be sent to your email");
            let errors = self.data_state.errors().clone();
            let response = ui_text_field(ui, &mut self.email, "Email", &errors, "email");
            let mut should_send = submitted(ui, &response);
            ui_request_errors(ui, &mut self.data_state, &["email"]);

            let is_allowed =
                !self.email.trim().is_empty() && !self.data_state.is_awaiting_response();
            if ui
                .add_enabled(is_allowed, egui::Button::new("Send Link"))
                .clicked()
            {
                should_send = true;
            }
            if should_send && is_allowed {
                let args = RequestPasswordChangeReqArgs::new(self.email.trim());
                let rx = data_shared
                    .client
                    .request_password_change(&args, wake_fn(ui.ctx().clone()));
                self.data_state = DataState::AwaitingResponse(AwaitingType(rx));
            }
        });
    }
}

impl UiConfirmPasswordChange {
    pub fn new(link: EmailLinkParams) -> Self {
        Self {
            link,
            new_password: SecretString::from(""),
            new_password_confirm: SecretString::from(""),
            data_state: Default::default(),
        }
    }

    fn args(&self) -> ConfirmPasswordChangeReqArgs {
        ConfirmPasswordChangeReqArgs::new(
            self.link.clone(),
            self.new_password.clone(),
            self.new_password_confirm.clone(),
        )
    }
}

impl DisplayablePage for UiConfirmPasswordChange {
    fn title(&self) -> String {
        "Set New Password".to_string()
    }

    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        ui.vertical_centered(|ui| {
            self.data_state.poll(Some(&mut *ui));
            if let DataState::Present(msg) = &self.data_state {
                ui.label(msg);
                if data_shared.user().is_none() && ui.button("Go to login").clicked() {
                    data_shared.navigate(Route::Login);
                }
                return;
            }

            let errors = self.data_state.errors().clone();
            let response = ui_password_edit(ui, &mut self.new_password, "New Password");
            let mut should_send = submitted(ui, &response);
            let response =
                ui_password_edit(ui, &mut self.new_password_confirm, "Confirm New Password");
            should_send |= submitted(ui, &response);
            ui_field_errors(ui, &errors, "newPassword");
            ui_request_errors(ui, &mut self.data_state, &["newPassword"]);

            let is_allowed = !self.data_state.is_awaiting_response();
            if ui
                .add_enabled(is_allowed, egui::Button::new("Set Password"))
                .clicked()
            {
                should_send = true;
            }
            if should_send && is_allowed {
                let args = self.args();
                self.data_state = match args.validate() {
                    Ok(()) => DataState::AwaitingResponse(AwaitingType(
                        data_shared
                            .client
                            .confirm_password_change(&args, wake_fn(ui.ctx().clone())),
                    )),
                    Err(errors) => DataState::Failed(errors),
                };
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_sent_with_link_from_route() {
        let mut page = UiConfirmPasswordChange::new(EmailLinkParams::new("MQ", "abc"));
        page.new_password = SecretString::from("new-secret");
        page.new_password_confirm = SecretString::from("new-secret");

        let args = page.args();

        assert_eq!(args.link, EmailLinkParams::new("MQ", "abc"));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn mismatch_reported_under_new_password() {
        let mut page = UiConfirmPasswordChange::new(EmailLinkParams::new("MQ", "abc"));
        page.new_password = SecretString::from("new-secret");
        page.new_password_confirm = SecretString::from("other");

        let errors = page.args().validate().unwrap_err();

        assert!(errors.field("newPassword").is_some());
    }
}
