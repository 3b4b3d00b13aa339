use car_notes_shared::req_args::auth::DeleteAccountReqArgs;
use secrecy::{ExposeSecret as _, SecretString};

use super::{
    data_state::{AwaitingType, DataState},
    ui_request_errors, DisplayablePage,
};
use crate::{
    app::wake_fn,
    ui_helpers::{submitted, ui_field_errors, ui_password_edit},
    DataShared,
};

/// On success the client ends the session and the route guard moves on to
/// the login page
#[derive(Debug)]
pub struct UiDeleteAccount {
    password: SecretString,
    data_state: DataState<()>,
}

impl Default for UiDeleteAccount {
    fn default() -> Self {
        Self {
            password: SecretString::from(""),
            data_state: Default::default(),
        }
    }
}

impl DisplayablePage for UiDeleteAccount {
    fn title(&self) -> String {
        "Delete Account".to_string()
    }

    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        ui.vertical_centered(|ui| {
            self.data_state.poll(Some(&mut *ui));
            ui.label("This deletes your account and all of your cars. It cannot be undone.");
            ui.label("Enter your password to confirm");

            let errors = self.data_state.errors().clone();
            let response = ui_password_edit(ui, &mut self.password, "Password");
            let mut should_send = submitted(ui, &response);
            ui_field_errors(ui, &errors, "password");
            ui_request_errors(ui, &mut self.data_state, &["password"]);

            let is_allowed = !self.password.expose_secret().is_empty()
                && !self.data_state.is_awaiting_response();
            if ui
                .add_enabled(is_allowed, egui::Button::new("Delete Account"))
                .clicked()
            {
                should_send = true;
            }
            if should_send && is_allowed {
                let args = DeleteAccountReqArgs::new(self.password.clone());
                let rx = data_shared
                    .client
                    .delete_account(&args, wake_fn(ui.ctx().clone()));
                self.data_state = DataState::AwaitingResponse(AwaitingType(rx));
            }
        });
    }
}
