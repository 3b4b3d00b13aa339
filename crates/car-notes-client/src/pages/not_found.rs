use super::DisplayablePage;
use crate::{routes::Route, DataShared};

#[derive(Debug)]
pub struct UiNotFound {
    path: String,
}

impl UiNotFound {
    pub fn new(path: String) -> Self {
        Self { path }
    }
}

impl DisplayablePage for UiNotFound {
    fn title(&self) -> String {
        "Page Not Found".to_string()
    }

    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        ui.vertical_centered(|ui| {
            ui.label(format!("Nothing found at {:?}", self.path));
            if ui.button("Go Home").clicked() {
                data_shared.navigate(Route::default());
            }
        });
    }
}
