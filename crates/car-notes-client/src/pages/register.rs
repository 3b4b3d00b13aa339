use car_notes_shared::req_args::auth::RegisterReqArgs;
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

const FIELDS: [&str; 4] = ["username", "email", "password", "confirmPassword"];

#[derive(Debug)]
pub struct UiRegister {
    username: String,
    email: String,
    password: SecretString,
    confirm_password: SecretString,
    /// Holds the message from the server once registered
    data_state: DataState<String>,
}

impl Default for UiRegister {
    fn default() -> Self {
        Self {
            username: Default::default(),
            email: Default::default(),
            password: SecretString::from(""),
            confirm_password: SecretString::from(""),
            data_state: Default::default(),
        }
    }
}

impl DisplayablePage for UiRegister {
    fn title(&self) -> String {
        "Register".to_string()
    }

    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        ui.vertical_centered(|ui| {
            self.data_state.poll(Some(&mut *ui));
            if let DataState::Present(msg) = &self.data_state {
                ui.label(msg);
                if ui.button("Go to login").clicked() {
                    data_shared.navigate(Route::Login);
                }
                return;
            }

            let mut should_send = self.show_inputs(ui);
            ui_request_errors(ui, &mut self.data_state, &FIELDS);
            if ui
                .add_enabled(
                    !self.data_state.is_awaiting_response(),
                    egui::Button::new("Register"),
                )
                .clicked()
            {
                should_send = true;
            }
            if should_send && !self.data_state.is_awaiting_response() {
                self.send(ui, data_shared);
            }

            ui.add_space(10.0);
            if ui.link("Already have an account? Login").clicked() {
                data_shared.navigate(Route::Login);
            }
        });
    }
}

impl UiRegister {
    /// Returns true if enter was pressed in one of the inputs
    fn show_inputs(&mut self, ui: &mut egui::Ui) -> bool {
        let errors = self.data_state.errors().clone();
        let mut is_submitted = false;

        let response = ui_text_field(ui, &mut self.username, "Username", &errors, "username");
        is_submitted |= submitted(ui, &response);
        let response = ui_text_field(ui, &mut self.email, "Email", &errors, "email");
        is_submitted |= submitted(ui, &response);
        let response = ui_password_edit(ui, &mut self.password, "Password");
        is_submitted |= submitted(ui, &response);
        ui_field_errors(ui, &errors, "password");
        let response = ui_password_edit(ui, &mut self.confirm_password, "Confirm Password");
        is_submitted |= submitted(ui, &response);
        ui_field_errors(ui, &errors, "confirmPassword");

        is_submitted
    }

    fn args(&self) -> RegisterReqArgs {
        RegisterReqArgs::new(
            self.username.trim(),
            self.email.trim(),
            self.password.clone(),
            self.confirm_password.clone(),
        )
    }

    fn send(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        let args = self.args();
        self.data_state = match args.validate() {
            Ok(()) => DataState::AwaitingResponse(AwaitingType(
                data_shared
                    .client
                    .register(&args, wake_fn(ui.ctx().clone())),
            )),
            Err(errors) => DataState::Failed(errors),
        };
    }
}

#[cfg(test)]
mod tests {
    use car_notes_shared::errors::ErrorBody;

    use super::*;

    #[test]
    fn args_are_trimmed() {
        let page = UiRegister {
            username: " jane ".into(),
            email: "jane@example.com\n".into(),
            ..Default::default()
        };
        let args = page.args();
        assert_eq!(args.username, "jane");
        assert_eq!(args.email, "jane@example.com");
    }

    #[test]
    fn every_field_error_has_an_input() {
        let page = UiRegister::default();
        let Err(ErrorBody::Fields(errors)) = page.args().validate() else {
            panic!("blank form should not be valid");
        };
        for field in errors.keys() {
            assert!(FIELDS.contains(&field.as_str()), "{field} has no input");
        }
    }
}
