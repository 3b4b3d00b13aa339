use std::sync::Arc;

use car_notes_client_core::QueryState;
use car_notes_shared::{
    car::{Car, CarFilterOptions},
    id::DbId,
    list_query::{CarListQuery, FilterKind},
    paginated::Paginated,
    user::User,
};
use egui_extras::{Column, TableBuilder};
use tracing::info;

use super::{
    data_state::{AwaitingType, DataState},
    ui_request_errors, DisplayablePage,
};
use crate::{app::wake_fn, routes::Route, ui_helpers::get_text_height, DataShared};

/// The cars of the user, or of every user for the admin view, with filters
/// and page selection
#[derive(Debug)]
pub struct UiCarList {
    query: CarListQuery,
    is_admin_view: bool,
    delete_state: DataState<()>,
}

/// What may be done with a car in the list
#[derive(Debug, PartialEq, Eq)]
struct CardActions {
    edit: Option<Route>,
    delete: Option<DeleteVia>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeleteVia {
    Owner,
    Admin,
}

fn card_actions(user: &User, car: &Car, is_admin_view: bool) -> CardActions {
    let edit = user.can_edit(car).then(|| {
        if is_admin_view {
            Route::AdminEditCar(car.id)
        } else {
            Route::EditCar(car.id)
        }
    });
    let delete = user.can_delete(car).then_some(if user.is_admin() {
        DeleteVia::Admin
    } else {
        DeleteVia::Owner
    });
    CardActions { edit, delete }
}

impl UiCarList {
    pub fn new(query: CarListQuery, is_admin_view: bool) -> Self {
        Self {
            query,
            is_admin_view,
            delete_state: Default::default(),
        }
    }

    fn route_for(&self, query: CarListQuery) -> Route {
        if self.is_admin_view {
            Route::Admin(query)
        } else {
            Route::Home(query)
        }
    }

    fn ui_filters(&self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        ui.heading("Filters");
        let options = data_shared
            .client
            .car_filter_options(wake_fn(ui.ctx().clone()));
        let options: Arc<CarFilterOptions> = match options {
            QueryState::Loading => {
                ui.spinner();
                return;
            }
            QueryState::Ready(data) | QueryState::Refreshing(data) => data,
            QueryState::Failed(msg) => {
                ui.colored_label(ui.visuals().error_fg_color, msg);
                return;
            }
        };
        let mut new_query = None;
        for (kind, heading, values) in [
            (FilterKind::Brand, "Brand", &options.brands),
            (FilterKind::Motor, "Motor", &options.motors),
        ] {
            ui.separator();
            ui.strong(heading);
            for value in values {
                let mut is_selected = self.query.is_selected(kind, value);
                if ui.checkbox(&mut is_selected, value.as_str()).changed() {
                    let mut query = self.query.clone();
                    query.set_filter(kind, value, is_selected);
                    new_query = Some(query);
                }
            }
        }
        ui.separator();
        if ui
            .add_enabled(self.query.has_filters(), egui::Button::new("Clear Filters"))
            .clicked()
        {
            let mut query = self.query.clone();
            query.clear_filters();
            new_query = Some(query);
        }
        if let Some(query) = new_query {
            data_shared.navigate(self.route_for(query));
        }
    }

    fn ui_cars(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared, user: &User) {
        let wake = wake_fn(ui.ctx().clone());
        let state = if self.is_admin_view {
            data_shared.client.cars_admin(&self.query, wake)
        } else {
            data_shared.client.cars(&self.query, wake)
        };
        let cars = match state {
            QueryState::Loading => {
                ui.spinner();
                return;
            }
            QueryState::Ready(data) => data,
            QueryState::Refreshing(data) => {
                ui.spinner();
                data
            }
            QueryState::Failed(msg) => {
                ui.colored_label(ui.visuals().error_fg_color, msg);
                return;
            }
        };

        self.delete_state.poll(Some(&mut *ui));
        ui_request_errors(ui, &mut self.delete_state, &[]);

        if cars.is_empty() {
            ui.label("No cars found");
        } else if let Some(to_delete) = self.ui_table(ui, data_shared, user, &cars) {
            self.send_delete(ui, data_shared, to_delete);
        }
        self.ui_pages(ui, data_shared, &cars);
    }

    /// Returns the car to delete if requested
    fn ui_table(
        &self,
        ui: &mut egui::Ui,
        data_shared: &mut DataShared,
        user: &User,
        cars: &Paginated<Car>,
    ) -> Option<(DbId, DeleteVia)> {
        let mut result = None;
        let text_height = get_text_height(ui);
        let is_deleting = self.delete_state.is_awaiting_response();
        let column_count = if self.is_admin_view { 5 } else { 4 };
        let mut table_builder = TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center));
        for _ in 1..column_count {
            table_builder = table_builder.column(Column::auto());
        }
        let table = table_builder
            .column(Column::remainder())
            .min_scrolled_height(0.0)
            .header(text_height, |mut header| {
                let mut headings = vec!["Model", "Brand", "Motor"];
                if self.is_admin_view {
                    headings.push("Owner");
                }
                headings.push("");
                for heading in headings {
                    header.col(|ui| {
                        ui.strong(heading);
                    });
                }
            });

        table.body(|body| {
            body.rows(text_height, cars.data.len(), |mut row| {
                let car = &cars.data[row.index()];
                row.col(|ui| {
                    ui.label(&car.model);
                });
                row.col(|ui| {
                    ui.label(&car.brand);
                });
                row.col(|ui| {
                    ui.label(&car.motor);
                });
                if self.is_admin_view {
                    row.col(|ui| {
                        ui.label(car.user.to_string());
                    });
                }
                row.col(|ui| {
                    let actions = card_actions(user, car, self.is_admin_view);
                    if let Some(route) = actions.edit {
                        if ui.button("Edit").clicked() {
                            data_shared.navigate(route);
                        }
                    }
                    if let Some(via) = actions.delete {
                        if ui
                            .add_enabled(!is_deleting, egui::Button::new("Delete"))
                            .clicked()
                        {
                            result = Some((car.id, via));
                        }
                    }
                });
            });
        });
        result
    }

    fn ui_pages(&self, ui: &mut egui::Ui, data_shared: &mut DataShared, cars: &Paginated<Car>) {
        ui.separator();
        ui.horizontal(|ui| {
            ui.label(format!("{} cars", cars.count));
            // The server answers pages out of range with the last page
            for page in cars.page_numbers() {
                if ui
                    .selectable_label(page == cars.page, page.to_string())
                    .clicked()
                    && page != cars.page
                {
                    let mut query = self.query.clone();
                    query.set_page(page);
                    data_shared.navigate(self.route_for(query));
                }
            }
        });
    }

    fn send_delete(
        &mut self,
        ui: &mut egui::Ui,
        data_shared: &mut DataShared,
        (id, via): (DbId, DeleteVia),
    ) {
        info!(%id, ?via, "deleting car");
        let wake = wake_fn(ui.ctx().clone());
        let rx = match via {
            DeleteVia::Owner => data_shared.client.delete_car(id, wake),
            DeleteVia::Admin => data_shared.client.delete_car_admin(id, wake),
        };
        self.delete_state = DataState::AwaitingResponse(AwaitingType(rx));
    }
}

impl DisplayablePage for UiCarList {
    fn title(&self) -> String {
        if self.is_admin_view {
            "All Cars"
        } else {
            "My Cars"
        }
        .to_string()
    }

    fn show(&mut self, ui: &mut egui::Ui, data_shared: &mut DataShared) {
        // Route guard keeps logged out users off this page
        let Some(user) = data_shared.user() else {
            return;
        };
        egui::SidePanel::left("car_filters")
            .resizable(false)
            .show_inside(ui, |ui| self.ui_filters(ui, data_shared));
        egui::CentralPanel::default().show_inside(ui, |ui| {
            self.ui_cars(ui, data_shared, &user);
        });
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn user(id: u64, is_staff: bool) -> User {
        User {
            id: id.into(),
            username: format!("user{id}"),
            email: None,
            first_name: String::new(),
            last_name: String::new(),
            is_staff,
            is_superuser: false,
            date_joined: "2024-02-03T04:05:06Z"
                .parse()
                .expect("hard coded date should be valid"),
            last_login: None,
        }
    }

    fn car_owned_by(owner: u64) -> Car {
        let timestamp = "2024-03-04T05:06:07Z"
            .parse()
            .expect("hard coded date should be valid");
        Car {
            id: 9.into(),
            user: owner.into(),
            brand: "Audi".into(),
            model: "A4".into(),
            motor: "Diesel".into(),
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    #[test]
    fn owner_may_edit_and_delete() {
        let actions = card_actions(&user(1, false), &car_owned_by(1), false);
        assert_eq!(
            actions,
            CardActions {
                edit: Some(Route::EditCar(9.into())),
                delete: Some(DeleteVia::Owner)
            }
        );
    }

    #[rstest]
    #[case::user_view(false)]
    #[case::admin_view(true)]
    fn non_owner_never_sees_edit(#[case] is_admin_view: bool) {
        let actions = card_actions(&user(2, false), &car_owned_by(1), is_admin_view);
        assert_eq!(actions.edit, None);
        assert_eq!(actions.delete, None);
    }

    #[test]
    fn staff_deletes_others_through_admin_endpoint() {
        let actions = card_actions(&user(2, true), &car_owned_by(1), true);
        assert_eq!(
            actions,
            CardActions {
                edit: None,
                delete: Some(DeleteVia::Admin)
            }
        );
    }

    #[test]
    fn staff_edits_own_car_from_admin_view() {
        let actions = card_actions(&user(1, true), &car_owned_by(1), true);
        assert_eq!(actions.edit, Some(Route::AdminEditCar(9.into())));
    }

    #[rstest]
    #[case(false, Route::Home(CarListQuery::new()))]
    #[case(true, Route::Admin(CarListQuery::new()))]
    fn links_stay_in_the_same_view(#[case] is_admin_view: bool, #[case] expected: Route) {
        let page = UiCarList::new(CarListQuery::new(), is_admin_view);
        assert_eq!(page.route_for(CarListQuery::new()), expected);
    }
}
