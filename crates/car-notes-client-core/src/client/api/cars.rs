use car_notes_shared::{
    car::{Car, CarFields, CarFilterOptions},
    const_config::path::{
        PathSpec, PATH_CARS_ADMIN_DELETE, PATH_CARS_ADMIN_LIST, PATH_CARS_CREATE,
        PATH_CARS_DELETE, PATH_CARS_DETAIL, PATH_CARS_FILTERS, PATH_CARS_LIST, PATH_CARS_UPDATE,
    },
    id::DbId,
    list_query::CarListQuery,
    paginated::Paginated,
};
use futures::channel::oneshot;

use crate::{
    cache::{CacheTag, QueryState},
    client::{OnSuccess, PendingQuery, UiCallBack, NO_ARGS},
    Client,
};

impl Client {
    /// Cars of the logged in user matching the filters, one page at a time
    #[tracing::instrument(skip(ui_notify))]
    pub fn cars<F: UiCallBack>(
        &self,
        query: &CarListQuery,
        ui_notify: F,
    ) -> QueryState<Paginated<Car>> {
        self.query(
            list_query(PATH_CARS_LIST, query),
            Some(&query.query_pairs()),
            ui_notify,
        )
    }

    /// Cars of all users, only available to staff
    ///
    /// The server sends all matching cars at once, they arrive as a single page
    #[tracing::instrument(skip(ui_notify))]
    pub fn cars_admin<F: UiCallBack>(
        &self,
        query: &CarListQuery,
        ui_notify: F,
    ) -> QueryState<Paginated<Car>> {
        self.query(
            list_query(PATH_CARS_ADMIN_LIST, query),
            Some(&query.query_pairs()),
            ui_notify,
        )
    }

    #[tracing::instrument(skip(ui_notify))]
    pub fn car<F: UiCallBack>(&self, id: DbId, ui_notify: F) -> QueryState<Car> {
        let path = PATH_CARS_DETAIL.with_params(&[("id", id.to_string().as_str())]);
        let pending = PendingQuery {
            key: path.clone(),
            path_spec: PATH_CARS_DETAIL,
            path,
            provides: detail_provides,
        };
        self.query(pending, NO_ARGS, ui_notify)
    }

    /// The distinct brands and motors to offer as filters
    #[tracing::instrument(skip(ui_notify))]
    pub fn car_filter_options<F: UiCallBack>(
        &self,
        ui_notify: F,
    ) -> QueryState<CarFilterOptions> {
        let pending = PendingQuery {
            key: PATH_CARS_FILTERS.path.to_string(),
            path_spec: PATH_CARS_FILTERS,
            path: PATH_CARS_FILTERS.path.to_string(),
            provides: |_: Option<&CarFilterOptions>| vec![CacheTag::CARS_FILTERS],
        };
        self.query(pending, NO_ARGS, ui_notify)
    }

    /// Returns the fields as saved by the server
    #[tracing::instrument(skip(ui_notify))]
    pub fn create_car<F: UiCallBack>(
        &self,
        fields: &CarFields,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<CarFields>> {
        self.send_request_expect_json(
            PATH_CARS_CREATE,
            &[],
            Some(fields),
            OnSuccess::Invalidate(vec![CacheTag::CARS_LIST, CacheTag::CARS_FILTERS]),
            ui_notify,
        )
    }

    /// The server responds without a body, with either 200 or 204
    #[tracing::instrument(skip(ui_notify))]
    pub fn update_car<F: UiCallBack>(
        &self,
        id: DbId,
        fields: &CarFields,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_request_expect_empty(
            PATH_CARS_UPDATE,
            &[("id", id.to_string().as_str())],
            Some(fields),
            OnSuccess::Invalidate(invalidated_by_change_to(id)),
            ui_notify,
        )
    }

    /// Deletes a car owned by the logged in user
    #[tracing::instrument(skip(ui_notify))]
    pub fn delete_car<F: UiCallBack>(
        &self,
        id: DbId,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_delete(PATH_CARS_DELETE, id, ui_notify)
    }

    /// Deletes any user's car, only available to staff
    #[tracing::instrument(skip(ui_notify))]
    pub fn delete_car_admin<F: UiCallBack>(
        &self,
        id: DbId,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_delete(PATH_CARS_ADMIN_DELETE, id, ui_notify)
    }

    fn send_delete<F: UiCallBack>(
        &self,
        path_spec: PathSpec,
        id: DbId,
        ui_notify: F,
    ) -> oneshot::Receiver<anyhow::Result<()>> {
        self.send_request_expect_empty(
            path_spec,
            &[("id", id.to_string().as_str())],
            NO_ARGS,
            OnSuccess::Invalidate(invalidated_by_change_to(id)),
            ui_notify,
        )
    }
}

fn list_query(path_spec: PathSpec, query: &CarListQuery) -> PendingQuery<Paginated<Car>> {
    PendingQuery {
        key: format!("{}?{}", path_spec.path, query.to_query_string()),
        path: path_spec.path.to_string(),
        path_spec,
        provides: list_provides,
    }
}

/// One tag per car on the page plus the list tag, which is also provided when
/// the request fails so that it is retried after the next change
fn list_provides(page: Option<&Paginated<Car>>) -> Vec<CacheTag> {
    page.into_iter()
        .flat_map(|page| page.data.iter().map(|car| CacheTag::car(car.id)))
        .chain([CacheTag::CARS_LIST])
        .collect()
}

fn detail_provides(car: Option<&Car>) -> Vec<CacheTag> {
    car.map(|car| vec![CacheTag::car(car.id)]).unwrap_or_default()
}

/// Tags to invalidate when a car is updated or deleted
fn invalidated_by_change_to(id: DbId) -> Vec<CacheTag> {
    vec![CacheTag::car(id), CacheTag::CARS_LIST, CacheTag::CARS_FILTERS]
}
