use actix_web::{web, HttpResponse};
use car_notes_shared::{car::CarFields, user::User};

use crate::{
    backend::{parse_page, CarFilter, FakeBackend},
    errors::BackendError,
    session_state::LoggedInUser,
};

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ListParams {
    #[serde(flatten)]
    filter: CarFilter,
    page: Option<String>,
}

#[tracing::instrument(skip(user, backend))]
pub(crate) async fn list(
    LoggedInUser(user): LoggedInUser,
    web::Query(params): web::Query<ListParams>,
    backend: web::Data<FakeBackend>,
) -> Result<HttpResponse, BackendError> {
    let page = parse_page(params.page.as_deref());
    let cars = backend.list_cars(user.id, &params.filter, page);
    Ok(HttpResponse::Ok().json(cars))
}

/// Cars of every user as a single array, staff only
#[tracing::instrument(skip(user, backend))]
pub(crate) async fn list_all(
    LoggedInUser(user): LoggedInUser,
    web::Query(filter): web::Query<CarFilter>,
    backend: web::Data<FakeBackend>,
) -> Result<HttpResponse, BackendError> {
    require_staff(&user)?;
    Ok(HttpResponse::Ok().json(backend.all_cars(&filter)))
}

#[tracing::instrument(skip_all)]
pub(crate) async fn filter_options(
    LoggedInUser(user): LoggedInUser,
    backend: web::Data<FakeBackend>,
) -> HttpResponse {
    HttpResponse::Ok().json(backend.filter_options(user.id))
}

#[tracing::instrument(skip(user, backend))]
pub(crate) async fn detail(
    LoggedInUser(user): LoggedInUser,
    id: web::Path<u64>,
    backend: web::Data<FakeBackend>,
) -> Result<HttpResponse, BackendError> {
    let car = backend.car(user.id, id.into_inner().into())?;
    Ok(HttpResponse::Ok().json(car))
}

/// Responds with only the fields that were saved
#[tracing::instrument(skip(user, backend))]
pub(crate) async fn create(
    LoggedInUser(user): LoggedInUser,
    web::Json(fields): web::Json<CarFields>,
    backend: web::Data<FakeBackend>,
) -> Result<HttpResponse, BackendError> {
    fields.validate()?;
    Ok(HttpResponse::Created().json(backend.create_car(user.id, fields)))
}

/// Responds without a body
#[tracing::instrument(skip(user, backend))]
pub(crate) async fn update(
    LoggedInUser(user): LoggedInUser,
    id: web::Path<u64>,
    web::Json(fields): web::Json<CarFields>,
    backend: web::Data<FakeBackend>,
) -> Result<HttpResponse, BackendError> {
    fields.validate()?;
    backend.update_car(user.id, id.into_inner().into(), fields)?;
    Ok(HttpResponse::Ok().finish())
}

#[tracing::instrument(skip(user, backend))]
pub(crate) async fn delete(
    LoggedInUser(user): LoggedInUser,
    id: web::Path<u64>,
    backend: web::Data<FakeBackend>,
) -> Result<HttpResponse, BackendError> {
    backend.delete_car(Some(user.id), id.into_inner().into())?;
    Ok(HttpResponse::NoContent().finish())
}

/// Deletes the car of any user, staff only
#[tracing::instrument(skip(user, backend))]
pub(crate) async fn delete_any(
    LoggedInUser(user): LoggedInUser,
    id: web::Path<u64>,
    backend: web::Data<FakeBackend>,
) -> Result<HttpResponse, BackendError> {
    require_staff(&user)?;
    backend.delete_car(None, id.into_inner().into())?;
    Ok(HttpResponse::NoContent().finish())
}

fn require_staff(user: &User) -> Result<(), BackendError> {
    if user.is_staff {
        Ok(())
    } else {
        Err(BackendError::PermissionDenied)
    }
}
