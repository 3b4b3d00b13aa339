use std::sync::Arc;

use car_notes_client_core::{Client, GuardStatus, SessionGuard, UiCallBack};
use car_notes_shared::user::User;
use strum::IntoEnumIterator as _;
use tracing::{info, instrument, warn};

use crate::pages::data_state::{AwaitingType, DataState};
use crate::pages::UiPage;
use crate::routes::Route;

/// We derive Deserialize/Serialize so we can persist app state on shutdown.
#[derive(Debug, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct CarNotesApp {
    data_shared: DataShared,
    #[serde(skip)]
    startup: Startup,
    /// The page and the route it was created for
    #[serde(skip)]
    page: Option<(Route, UiPage)>,
    #[serde(skip)]
    link_to_open: String,
    #[serde(skip)]
    link_error: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct DataShared {
    /// Filled in on the login page
    pub last_email: String,

    #[serde(skip)]
    pub client: Client,
    #[serde(skip)]
    route: Route,
    #[serde(skip)]
    requested_route: Option<Route>,
}

/// Steps before any page is shown
#[derive(Debug, Default)]
enum Startup {
    /// Mutating requests (including the session check) are rejected without
    /// the CSRF cookie
    #[default]
    FetchingCsrf,
    CsrfAwaiting(DataState<()>),
    CheckingSession(SessionGuard),
    Done,
}

/// Actions offered in the top panel once logged in
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter, strum::Display)]
enum NavAction {
    #[strum(to_string = "Cars")]
    Cars,
    #[strum(to_string = "Add Car")]
    AddCar,
    #[strum(to_string = "Change Password")]
    ChangePassword,
    #[strum(to_string = "Delete Account")]
    DeleteAccount,
    #[strum(to_string = "Logout")]
    Logout,
    #[strum(to_string = "Logout All Devices")]
    LogoutAllDevices,
}

impl DataShared {
    pub fn user(&self) -> Option<Arc<User>> {
        self.client.user()
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// The route is changed after the current frame has been drawn
    #[instrument(skip(self))]
    pub fn navigate(&mut self, route: Route) {
        self.requested_route = Some(route);
    }

    #[instrument(skip(self, ctx))]
    fn logout(&mut self, ctx: &egui::Context, all_devices: bool) {
        // Session is cleared right away, result only needed for logging
        let _rx = if all_devices {
            self.client.logout_all_devices(wake_fn(ctx.clone()))
        } else {
            self.client.logout(wake_fn(ctx.clone()))
        };
        self.navigate(Route::Login);
    }
}

impl eframe::App for CarNotesApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        info!("Saving with key: {}", eframe::APP_KEY);
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    /// Called each time the UI needs repainting, which may be many times per
    /// second. Put your widgets into a `SidePanel`, `TopPanel`,
    /// `CentralPanel`, `Window` or `Area`.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.top_panel(ctx);
        self.bottom_panel(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.run_startup(ui) {
                self.show_page(ui);
            }
        });
        self.apply_requested_route();
    }
}

impl CarNotesApp {
    /// Called once before the first frame.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        server_url: String,
        initial_route: Option<Route>,
    ) -> Self {
        // Load previous app state (if any).
        // Note that you must enable the `persistence` feature for this to work.
        let mut result: Self = if let Some(storage) = cc.storage {
            info!("Storage found. Loading...");
            match eframe::get_value(storage, eframe::APP_KEY) {
                Some(value) => {
                    info!("Loaded succeeded");
                    value
                }
                None => {
                    warn!("Load failed");
                    Default::default()
                }
            }
        } else {
            info!("No storage found");
            Default::default()
        };
        result.data_shared.client = Client::new(server_url);
        result.data_shared.route = initial_route.unwrap_or_default();
        result
    }

    /// Returns `true` once pages can be shown
    fn run_startup(&mut self, ui: &mut egui::Ui) -> bool {
        let client = &self.data_shared.client;
        let wake = wake_fn(ui.ctx().clone());
        match &mut self.startup {
            Startup::FetchingCsrf => {
                let mut state = DataState::default();
                state.get(Some(&mut *ui), None, || {
                    AwaitingType(client.fetch_csrf_cookie(wake))
                });
                self.startup = Startup::CsrfAwaiting(state);
            }
            Startup::CsrfAwaiting(state) => {
                ui.vertical_centered(|ui| {
                    state.get(Some(&mut *ui), Some("Retry connecting to the server"), || {
                        AwaitingType(client.fetch_csrf_cookie(wake))
                    });
                });
                if state.is_present() {
                    self.startup = Startup::CheckingSession(SessionGuard::new());
                    ui.ctx().request_repaint();
                }
            }
            Startup::CheckingSession(guard) => match guard.poll(client, wake) {
                GuardStatus::Checking => {
                    ui.vertical_centered(|ui| ui.spinner());
                }
                GuardStatus::Ready => {
                    self.startup = Startup::Done;
                    return true;
                }
            },
            Startup::Done => return true,
        }
        false
    }

    fn show_page(&mut self, ui: &mut egui::Ui) {
        let user = self.data_shared.user();
        let guarded = self.data_shared.route.clone().guarded(user.as_deref());
        if guarded != self.data_shared.route {
            info!(from = %self.data_shared.route, to = %guarded, "route guard redirect");
            self.set_route(guarded, false);
        }
        let route = &self.data_shared.route;
        let is_stale = !matches!(&self.page, Some((page_route, _)) if page_route == route);
        if is_stale {
            self.page = Some((route.clone(), UiPage::for_route(route)));
        }
        if let Some((_, page)) = self.page.as_mut() {
            page.display_page(ui, &mut self.data_shared);
        }
    }

    fn apply_requested_route(&mut self) {
        if let Some(route) = self.data_shared.requested_route.take() {
            if route != self.data_shared.route {
                self.set_route(route, true);
            }
        }
    }

    #[instrument(skip(self))]
    fn set_route(&mut self, route: Route, add_to_history: bool) {
        sync_address_bar(&route, add_to_history);
        self.data_shared.route = route;
    }

    fn top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                egui::widgets::global_theme_preference_switch(ui);
                ui.separator();
                match self.data_shared.user() {
                    Some(user) if matches!(self.startup, Startup::Done) => {
                        ui.label(format!("Welcome {}", user.username));
                        ui.separator();
                        self.ui_nav_buttons(ui, &user);
                    }
                    _ => {
                        ui.label("Car Notes");
                    }
                }
            });
        });
    }

    fn ui_nav_buttons(&mut self, ui: &mut egui::Ui, user: &User) {
        for action in NavAction::iter() {
            if ui.button(action.to_string()).clicked() {
                self.do_nav_action(ui.ctx(), action, user);
            }
        }
    }

    #[instrument(skip(self, ctx, user))]
    fn do_nav_action(&mut self, ctx: &egui::Context, action: NavAction, user: &User) {
        let data_shared = &mut self.data_shared;
        match action {
            NavAction::Cars => data_shared.navigate(if user.is_admin() {
                Route::Admin(Default::default())
            } else {
                Route::default()
            }),
            NavAction::AddCar => data_shared.navigate(Route::AddCar),
            NavAction::ChangePassword => data_shared.navigate(Route::RequestPasswordChange),
            NavAction::DeleteAccount => data_shared.navigate(Route::DeleteAccount),
            NavAction::Logout => data_shared.logout(ctx, false),
            NavAction::LogoutAllDevices => data_shared.logout(ctx, true),
        }
    }

    fn bottom_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("bottom_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                #[cfg(not(target_arch = "wasm32"))] // The browser already has an address bar
                self.ui_open_link(ui);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if let Some(user) = self.data_shared.user() {
                        ui.label(format!("Logged in as {}", user.username));
                    }
                    egui::warn_if_debug_build(ui);
                });
            });
        });
    }

    /// Allows following the links sent by email
    #[cfg_attr(target_arch = "wasm32", allow(dead_code))]
    fn ui_open_link(&mut self, ui: &mut egui::Ui) {
        let response = ui.add(
            egui::TextEdit::singleline(&mut self.link_to_open)
                .hint_text("Paste a link from an email")
                .desired_width(300.0),
        );
        let is_submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if ui.button("Open Link").clicked() || is_submitted {
            match Route::from_link(&self.link_to_open) {
                Ok(route) => {
                    self.link_to_open.clear();
                    self.link_error = None;
                    self.data_shared.navigate(route);
                }
                Err(e) => self.link_error = Some(e.to_string()),
            }
        }
        if let Some(e) = self.link_error.as_ref() {
            ui.colored_label(ui.visuals().error_fg_color, e);
        }
    }
}

/// Keeps the address bar in sync with the page shown
#[cfg(target_arch = "wasm32")]
fn sync_address_bar(route: &Route, add_to_history: bool) {
    let Some(history) = web_sys::window().and_then(|w| w.history().ok()) else {
        warn!("unable to access browser history");
        return;
    };
    let path = route.to_path();
    let result = if add_to_history {
        history.push_state_with_url(&eframe::wasm_bindgen::JsValue::NULL, "", Some(&path))
    } else {
        history.replace_state_with_url(&eframe::wasm_bindgen::JsValue::NULL, "", Some(&path))
    };
    car_notes_shared::log_err_as_warn!(result);
}

#[cfg(not(target_arch = "wasm32"))]
fn sync_address_bar(_route: &Route, _add_to_history: bool) {}

#[inline]
pub fn wake_fn(ctx: egui::Context) -> impl UiCallBack {
    move || ctx.request_repaint()
}
