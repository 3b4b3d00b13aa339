use actix_web::web;
use car_notes_shared::const_config::path::{
    PATH_AUTH_ACTIVATE_ACCOUNT, PATH_AUTH_CONFIRM_PASSWORD_CHANGE, PATH_AUTH_CSRF_COOKIE,
    PATH_AUTH_DELETE_ACCOUNT, PATH_AUTH_IS_AUTHENTICATED, PATH_AUTH_LOGIN, PATH_AUTH_LOGOUT,
    PATH_AUTH_LOGOUT_ALL, PATH_AUTH_REGISTER, PATH_AUTH_REQUEST_PASSWORD_CHANGE,
    PATH_CARS_ADMIN_DELETE, PATH_CARS_ADMIN_LIST, PATH_CARS_DETAIL, PATH_CARS_FILTERS,
    PATH_CARS_LIST,
};

mod auth;
mod cars;

/// Registers every endpoint of the server
///
/// The paths with fixed segments below `/cars/` must come before
/// [`PATH_CARS_DETAIL`] as its `{id}` would match them too
pub(crate) fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(PATH_AUTH_CSRF_COOKIE.path, web::post().to(auth::csrf_cookie))
        .route(
            PATH_AUTH_IS_AUTHENTICATED.path,
            web::post().to(auth::is_authenticated),
        )
        .route(PATH_AUTH_REGISTER.path, web::post().to(auth::register))
        .route(
            PATH_AUTH_ACTIVATE_ACCOUNT.path,
            web::post().to(auth::activate_account),
        )
        .route(PATH_AUTH_LOGIN.path, web::post().to(auth::login))
        .route(PATH_AUTH_LOGOUT.path, web::post().to(auth::logout))
        .route(PATH_AUTH_LOGOUT_ALL.path, web::post().to(auth::logout_all))
        .route(
            PATH_AUTH_DELETE_ACCOUNT.path,
            web::delete().to(auth::delete_account),
        )
        .route(
            PATH_AUTH_REQUEST_PASSWORD_CHANGE.path,
            web::post().to(auth::request_password_change),
        )
        .route(
            PATH_AUTH_CONFIRM_PASSWORD_CHANGE.path,
            web::put().to(auth::confirm_password_change),
        )
        .route(PATH_CARS_FILTERS.path, web::get().to(cars::filter_options))
        .route(PATH_CARS_ADMIN_LIST.path, web::get().to(cars::list_all))
        .route(PATH_CARS_ADMIN_DELETE.path, web::delete().to(cars::delete_any))
        .service(
            web::resource(PATH_CARS_LIST.path)
                .route(web::get().to(cars::list))
                .route(web::post().to(cars::create)),
        )
        .service(
            web::resource(PATH_CARS_DETAIL.path)
                .route(web::get().to(cars::detail))
                .route(web::put().to(cars::update))
                .route(web::delete().to(cars::delete)),
        );
}
