use car_notes_shared::req_args::EmailLinkParams;

use super::{
    data_state::{AwaitingType, DataState},
    DisplayablePage,
};
use crate::{app::wake_fn, routes::Route, DataShared};

/// Activates the account as soon as the page is opened from the emailed link
#[derive(Debug)]
pub struct UiActivate {
    link: EmailLinkParams,
    data_state: DataState<String>,
}

impl UiActivate {
    pub fn new(link: EmailLinkParams) -> Self {
        Self {
            link,
            data_state: Default::default(),
        }
    }
}

impl DisplayablePage for UiActivate {
    fn title(&self) -> String {
        "Account Activation".to_string()
    }

    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        ui.vertical_centered(|ui| {
            if let DataState::Present(msg) = &self.data_state {
                ui.label(msg);
                if ui.button("Go to login").clicked() {
                    data_shared.navigate(Route::Login);
                }
            } else {
                let ctx = ui.ctx().clone();
                self.data_state
                    .get(Some(&mut *ui), Some("Retry Activation"), || {
                        AwaitingType(data_shared.client.activate_account(&self.link, wake_fn(ctx)))
                    });
            }
        });
    }
}
