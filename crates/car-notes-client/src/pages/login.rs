use std::sync::Arc;

use car_notes_shared::{req_args::auth::LoginReqArgs, user::User};
use secrecy::{ExposeSecret as _, SecretString};
use tracing::info;

use super::{
    data_state::{AwaitingType, DataState},
    ui_request_errors, DisplayablePage,
};
use crate::{
    app::wake_fn,
    routes::Route,
    ui_helpers::{submitted, ui_password_edit},
    DataShared,
};

#[derive(Debug)]
pub struct UiLogin {
    password: SecretString,
    data_state: DataState<Arc<User>>,
}

impl Default for UiLogin {
    fn default() -> Self {
        Self {
            password: SecretString::from(""),
            data_state: Default::default(),
        }
    }
}

impl DisplayablePage for UiLogin {
    fn title(&self) -> String {
        "Login".to_string()
    }

    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        ui.vertical_centered(|ui| {
            let email_response = ui.add(
                egui::TextEdit::singleline(&mut data_shared.last_email).hint_text("Email"),
            );
            let password_response = ui_password_edit(ui, &mut self.password, "Password");
            let mut should_send =
                submitted(ui, &email_response) || submitted(ui, &password_response);

            self.check_login_attempt(ui);

            let is_allowed = self.is_allowed_to_login(&data_shared.last_email);
            if ui
                .add_enabled(is_allowed, egui::Button::new("Login"))
                .clicked()
            {
                should_send = true;
            }
            if should_send && is_allowed {
                self.send_login_attempt(ui, data_shared);
            }

            ui.add_space(10.0);
            if ui.link("No account yet? Register").clicked() {
                data_shared.navigate(Route::Register);
            }
            if ui.link("Forgot your password?").clicked() {
                data_shared.navigate(Route::RequestPasswordChange);
            }
        });
    }
}

impl UiLogin {
    /// Once the login succeeds the route guard leaves this page
    fn is_allowed_to_login(&self, email: &str) -> bool {
        !email.trim().is_empty()
            && !self.password.expose_secret().is_empty()
            && !self.data_state.is_awaiting_response()
            && !self.data_state.is_present()
    }

    fn check_login_attempt(&mut self, ui: &mut egui::Ui) {
        self.data_state.poll(Some(&mut *ui));
        ui_request_errors(ui, &mut self.data_state, &[]);
    }

    fn send_login_attempt(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        info!(email = %data_shared.last_email, "sending login attempt");
        let args = LoginReqArgs::new(data_shared.last_email.trim(), self.password.clone());
        let rx = data_shared.client.login(&args, wake_fn(ui.ctx().clone()));
        self.data_state = DataState::AwaitingResponse(AwaitingType(rx));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_requires_email_and_password() {
        let mut page = UiLogin::default();
        assert!(!page.is_allowed_to_login("jane@example.com"));

        page.password = SecretString::from("secret");
        assert!(!page.is_allowed_to_login("  "));
        assert!(page.is_allowed_to_login("jane@example.com"));
    }
}
