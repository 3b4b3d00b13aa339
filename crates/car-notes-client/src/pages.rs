use crate::{
    routes::Route,
    ui_helpers::{other_errors, ui_error_body},
    DataShared,
};

pub mod activate;
pub mod car_form;
pub mod car_list;
pub mod data_state;
pub mod delete_account;
pub mod forgotten_password;
pub mod login;
pub mod not_found;
pub mod register;

use activate::UiActivate;
use car_form::UiCarForm;
use car_list::UiCarList;
use data_state::DataState;
use delete_account::UiDeleteAccount;
use forgotten_password::{UiConfirmPasswordChange, UiRequestPasswordChange};
use login::UiLogin;
use not_found::UiNotFound;
use register::UiRegister;

/// The page shown for the current route along with its state
///
/// A new page (with fresh state) is created whenever the route changes
#[derive(Debug)]
pub enum UiPage {
    Activate(UiActivate),
    CarForm(UiCarForm),
    CarList(UiCarList),
    ConfirmPasswordChange(UiConfirmPasswordChange),
    DeleteAccount(UiDeleteAccount),
    Login(UiLogin),
    NotFound(UiNotFound),
    Register(UiRegister),
    RequestPasswordChange(UiRequestPasswordChange),
}

/// Trait for types that can be treated as pages to display
pub trait DisplayablePage {
    /// Shown as the heading of the page
    fn title(&self) -> String;

    /// Displays the page
    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared);
}

macro_rules! do_on_ui_page {
    ($on:ident, $page:ident, $body:tt) => {
        match $on {
            UiPage::Activate($page) => $body,
            UiPage::CarForm($page) => $body,
            UiPage::CarList($page) => $body,
            UiPage::ConfirmPasswordChange($page) => $body,
            UiPage::DeleteAccount($page) => $body,
            UiPage::Login($page) => $body,
            UiPage::NotFound($page) => $body,
            UiPage::Register($page) => $body,
            UiPage::RequestPasswordChange($page) => $body,
        }
    };
}

impl UiPage {
    #[tracing::instrument(ret)]
    pub fn for_route(route: &Route) -> Self {
        match route {
            Route::Home(query) => Self::CarList(UiCarList::new(query.clone(), false)),
            Route::Admin(query) => Self::CarList(UiCarList::new(query.clone(), true)),
            Route::AddCar => Self::CarForm(UiCarForm::new_car()),
            Route::EditCar(id) => Self::CarForm(UiCarForm::edit(*id, false)),
            Route::AdminEditCar(id) => Self::CarForm(UiCarForm::edit(*id, true)),
            Route::DeleteAccount => Self::DeleteAccount(Default::default()),
            Route::Register => Self::Register(Default::default()),
            Route::Login => Self::Login(Default::default()),
            Route::Activate(link) => Self::Activate(UiActivate::new(link.clone())),
            Route::RequestPasswordChange => Self::RequestPasswordChange(Default::default()),
            Route::ConfirmPasswordChange(link) => {
                Self::ConfirmPasswordChange(UiConfirmPasswordChange::new(link.clone()))
            }
            Route::NotFound(path) => Self::NotFound(UiNotFound::new(path.clone())),
        }
    }

    pub fn display_page(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        do_on_ui_page!(self, page, { show_page(page, ui, data_shared) })
    }

    pub fn title(&self) -> String {
        do_on_ui_page!(self, page, { page.title() })
    }
}

fn show_page<P: DisplayablePage>(page: &mut P, ui: &mut egui::Ui, data_shared: &mut DataShared) {
    ui.vertical_centered(|ui| {
        ui.heading(page.title());
    });
    ui.separator();
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| page.show(ui, data_shared));
}

/// Shows the messages of a failed request that are not already shown next to
/// one of `fields`, along with a button to dismiss them
fn ui_request_errors<T>(ui: &mut egui::Ui, data_state: &mut DataState<T>, fields: &[&str]) {
    let DataState::Failed(errors) = data_state else {
        return;
    };
    ui_error_body(ui, &other_errors(errors, fields));
    if ui.button("Clear error status").clicked() {
        *data_state = DataState::None;
    }
}
