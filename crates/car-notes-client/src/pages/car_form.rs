use car_notes_client_core::QueryState;
use car_notes_shared::{car::CarFields, errors::ErrorBody, id::DbId, list_query::CarListQuery};

use super::{
    data_state::{AwaitingType, DataState},
    ui_request_errors, DisplayablePage,
};
use crate::{
    app::wake_fn,
    routes::Route,
    ui_helpers::{submitted, ui_text_field},
    DataShared,
};

const FIELDS: [&str; 3] = ["brand", "model", "motor"];

/// Used both to add a new car and to edit an existing one
#[derive(Debug)]
pub struct UiCarForm {
    mode: FormMode,
    fields: CarFields,
    save_state: SaveState,
}

/// Creating responds with the saved car, updating without a body
#[derive(Debug)]
enum SaveState {
    Create(DataState<CarFields>),
    Update(DataState<()>),
}

impl SaveState {
    fn for_mode(mode: FormMode) -> Self {
        match mode {
            FormMode::New => Self::Create(Default::default()),
            FormMode::Edit { .. } => Self::Update(Default::default()),
        }
    }

    fn poll(&mut self, ui: Option<&mut egui::Ui>) {
        match self {
            Self::Create(state) => state.poll(ui),
            Self::Update(state) => state.poll(ui),
        }
    }

    fn is_saved(&self) -> bool {
        match self {
            Self::Create(state) => state.is_present(),
            Self::Update(state) => state.is_present(),
        }
    }

    fn is_awaiting_response(&self) -> bool {
        match self {
            Self::Create(state) => state.is_awaiting_response(),
            Self::Update(state) => state.is_awaiting_response(),
        }
    }

    fn errors(&self) -> &ErrorBody {
        match self {
            Self::Create(state) => state.errors(),
            Self::Update(state) => state.errors(),
        }
    }

    fn fail(&mut self, errors: ErrorBody) {
        match self {
            Self::Create(state) => *state = DataState::Failed(errors),
            Self::Update(state) => *state = DataState::Failed(errors),
        }
    }

    fn ui_errors(&mut self, ui: &mut egui::Ui) {
        match self {
            Self::Create(state) => ui_request_errors(ui, state, &FIELDS),
            Self::Update(state) => ui_request_errors(ui, state, &FIELDS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormMode {
    New,
    Edit {
        id: DbId,
        is_admin: bool,
        is_loaded: bool,
    },
}

impl UiCarForm {
    pub fn new_car() -> Self {
        Self::with_mode(FormMode::New)
    }

    pub fn edit(id: DbId, is_admin: bool) -> Self {
        Self::with_mode(FormMode::Edit {
            id,
            is_admin,
            is_loaded: false,
        })
    }

    fn with_mode(mode: FormMode) -> Self {
        Self {
            mode,
            fields: Default::default(),
            save_state: SaveState::for_mode(mode),
        }
    }

    /// Where to go once saved
    fn list_route(&self) -> Route {
        match self.mode {
            FormMode::Edit { is_admin: true, .. } => Route::Admin(CarListQuery::new()),
            _ => Route::default(),
        }
    }

    /// Fills the inputs with the saved values, returns false until they are
    /// available
    fn load_existing(&mut self, ui: &mut egui::Ui, data_shared: &DataShared) -> bool {
        let FormMode::Edit { id, is_loaded, .. } = &mut self.mode else {
            return true;
        };
        if *is_loaded {
            return true;
        }
        match data_shared.client.car(*id, wake_fn(ui.ctx().clone())) {
            QueryState::Loading => {
                ui.spinner();
                false
            }
            QueryState::Ready(car) | QueryState::Refreshing(car) => {
                self.fields = CarFields::from(car.as_ref());
                *is_loaded = true;
                true
            }
            QueryState::Failed(msg) => {
                ui.colored_label(ui.visuals().error_fg_color, msg);
                false
            }
        }
    }

    fn send(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        if let Err(errors) = self.fields.validate() {
            self.save_state.fail(errors);
            return;
        }
        let wake = wake_fn(ui.ctx().clone());
        self.save_state = match self.mode {
            FormMode::New => SaveState::Create(DataState::AwaitingResponse(AwaitingType(
                data_shared.client.create_car(&self.fields, wake),
            ))),
            FormMode::Edit { id, .. } => SaveState::Update(DataState::AwaitingResponse(
                AwaitingType(data_shared.client.update_car(id, &self.fields, wake)),
            )),
        };
    }
}

impl DisplayablePage for UiCarForm {
    fn title(&self) -> String {
        match self.mode {
            FormMode::New => "Add Car",
            FormMode::Edit { .. } => "Edit Car",
        }
        .to_string()
    }

    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        ui.vertical_centered(|ui| {
            if !self.load_existing(ui, data_shared) {
                return;
            }
            self.save_state.poll(Some(&mut *ui));
            if self.save_state.is_saved() {
                data_shared.navigate(self.list_route());
                return;
            }

            let errors = self.save_state.errors().clone();
            let mut should_send = false;
            let CarFields {
                brand,
                model,
                motor,
            } = &mut self.fields;
            for (value, hint, field) in [
                (brand, "Brand", "brand"),
                (model, "Model", "model"),
                (motor, "Motor", "motor"),
            ] {
                let response = ui_text_field(ui, value, hint, &errors, field);
                should_send |= submitted(ui, &response);
            }
            self.save_state.ui_errors(ui);

            let is_allowed = !self.save_state.is_awaiting_response();
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(is_allowed, egui::Button::new("Save"))
                    .clicked()
                {
                    should_send = true;
                }
                if ui.button("Cancel").clicked() {
                    data_shared.navigate(self.list_route());
                }
            });
            if should_send && is_allowed {
                self.send(ui, data_shared);
            }
        });
    }
}
